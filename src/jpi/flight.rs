//! Binary flight blocks: the fixed flight header and the delta-coded data records.
//!
//! Flight header (big-endian):
//!
//! | bytes | field                                                   |
//! |-------|---------------------------------------------------------|
//! | 2     | recorder flight number (matches the `$D` record)        |
//! | 4     | flags (GPS lanes, hour meter lanes)                     |
//! | 2     | sample interval in seconds                              |
//! | 2     | date: day 5 bits, month 4 bits, years since 2000 7 bits |
//! | 2     | time: 2-second units 5 bits, minutes 6 bits, hours 5 bits |
//! | 1     | XOR of the preceding 12 bytes                           |
//!
//! Data record:
//!
//! | bytes | field                                                  |
//! |-------|--------------------------------------------------------|
//! | 2 + 2 | decode flags, written twice                            |
//! | 1     | repeat count: previous sample repeats this many times  |
//! | n     | field flags, one byte per set decode-flag bit          |
//! | n     | sign flags, one byte per set decode-flag bit           |
//! | m     | one delta magnitude per set field-flag bit             |
//! | 1     | XOR of the preceding record bytes                      |

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::trace;

use super::consts::{
    FIELD_FLAG_BYTES, FLAG_GPS, FLIGHT_HEADER_SIZE, LANE_COUNT, MAX_FLIGHT_SAMPLES, YEAR_BASE,
};
use super::error::DecodeError;
use super::fields::{FIELDS, Render};
use super::header::header_checksum;
use crate::samples::{DATE_FORMAT, FieldTag, FlightSampleRow, TIME_FORMAT};

/// Smallest possible data record: flags twice, repeat count, checksum
pub const MIN_RECORD_SIZE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightHeader {
    pub number: u32,
    pub flags: u32,
    pub interval_secs: u32,
    pub start: NaiveDateTime,
}

/// Bounds-checked big-endian reader over one flight block
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8], pos: usize, end: usize) -> Self {
        Self { data, pos, end }
    }

    fn remaining(&self) -> usize {
        self.end.saturating_sub(self.pos)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        if self.pos >= self.end {
            return Err(DecodeError::UnexpectedEof(self.pos));
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes([self.u8()?, self.u8()?]))
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes([self.u8()?, self.u8()?, self.u8()?, self.u8()?]))
    }
}

/// Pack a start timestamp into the header's date and time words.
/// Seconds are stored in 2-second units; odd seconds round down.
pub fn pack_timestamp(start: NaiveDateTime) -> Option<(u16, u16)> {
    use chrono::{Datelike, Timelike};

    let years = start.year() - YEAR_BASE;
    if !(0..=127).contains(&years) {
        return None;
    }
    let date = ((years as u16) << 9) | ((start.month() as u16) << 5) | start.day() as u16;
    let time =
        ((start.hour() as u16) << 11) | ((start.minute() as u16) << 5) | (start.second() / 2) as u16;
    Some((date, time))
}

pub fn unpack_timestamp(date: u16, time: u16) -> Option<NaiveDateTime> {
    let day = (date & 0x1f) as u32;
    let month = ((date >> 5) & 0x0f) as u32;
    let year = YEAR_BASE + (date >> 9) as i32;
    let seconds = (time & 0x1f) as u32 * 2;
    let minutes = ((time >> 5) & 0x3f) as u32;
    let hours = (time >> 11) as u32;

    let d = NaiveDate::from_ymd_opt(year, month, day)?;
    let t = NaiveTime::from_hms_opt(hours, minutes, seconds)?;
    Some(NaiveDateTime::new(d, t))
}

/// Read and validate the flight header at `offset`
pub fn read_flight_header(
    data: &[u8],
    offset: usize,
    end: usize,
    expected_number: u32,
) -> Result<FlightHeader, DecodeError> {
    let mut cursor = Cursor::new(data, offset, end);
    let number = cursor.u16()? as u32;
    let flags = cursor.u32()?;
    let interval = cursor.u16()?;
    let date = cursor.u16()?;
    let time = cursor.u16()?;
    let stored = cursor.u8()?;

    if header_checksum(&data[offset..offset + FLIGHT_HEADER_SIZE - 1]) != stored {
        return Err(DecodeError::FlightHeaderChecksum(offset));
    }
    if number != expected_number {
        return Err(DecodeError::FlightNumberMismatch {
            offset,
            expected: expected_number,
            found: number,
        });
    }
    if interval == 0 {
        return Err(DecodeError::InvalidInterval(number));
    }
    let start = unpack_timestamp(date, time).ok_or(DecodeError::InvalidTimestamp {
        flight: number,
        date,
        time,
    })?;

    Ok(FlightHeader {
        number,
        flags,
        interval_secs: interval as u32,
        start,
    })
}

/// Decode every data record of the flight block `[offset, end)` into sample rows.
///
/// Any truncated or corrupt record fails the whole flight; no partial table is
/// returned. Up to `MIN_RECORD_SIZE - 1` zero bytes of padding may follow the
/// last record. A flight expanding past `MAX_FLIGHT_SAMPLES` rows is rejected
/// before the rows are built.
pub fn decode_records(
    data: &[u8],
    offset: usize,
    end: usize,
    header: &FlightHeader,
) -> Result<Vec<FlightSampleRow>, DecodeError> {
    let mut cursor = Cursor::new(data, offset + FLIGHT_HEADER_SIZE, end);
    let mut lanes = [0i64; LANE_COUNT];
    let mut rows: Vec<FlightSampleRow> = Vec::new();

    while cursor.remaining() >= MIN_RECORD_SIZE {
        let record_start = cursor.pos;
        let decode_flags = cursor.u16()?;
        if cursor.u16()? != decode_flags {
            return Err(DecodeError::CorruptRecord {
                offset: record_start,
                reason: "decode flag copies differ",
            });
        }
        let repeat = cursor.u8()?;

        let mut field_flags = [0u8; FIELD_FLAG_BYTES];
        let mut sign_flags = [0u8; FIELD_FLAG_BYTES];
        for (i, slot) in field_flags.iter_mut().enumerate() {
            if decode_flags & (1 << i) != 0 {
                *slot = cursor.u8()?;
            }
        }
        for (i, slot) in sign_flags.iter_mut().enumerate() {
            if decode_flags & (1 << i) != 0 {
                *slot = cursor.u8()?;
            }
        }

        let mut deltas: Vec<(usize, i64)> = Vec::new();
        for (i, &flags) in field_flags.iter().enumerate() {
            for bit in 0..8 {
                if flags & (1 << bit) != 0 {
                    let magnitude = cursor.u8()? as i64;
                    let delta = if sign_flags[i] & (1 << bit) != 0 {
                        -magnitude
                    } else {
                        magnitude
                    };
                    deltas.push((i * 8 + bit, delta));
                }
            }
        }

        let computed = header_checksum(&data[record_start..cursor.pos]);
        if cursor.u8()? != computed {
            return Err(DecodeError::CorruptRecord {
                offset: record_start,
                reason: "record checksum mismatch",
            });
        }

        if rows.len() + repeat as usize >= MAX_FLIGHT_SAMPLES {
            return Err(DecodeError::TooManySamples {
                flight: header.number,
                limit: MAX_FLIGHT_SAMPLES,
            });
        }

        if repeat > 0 {
            if rows.is_empty() {
                return Err(DecodeError::CorruptRecord {
                    offset: record_start,
                    reason: "repeat count before the first sample",
                });
            }
            for _ in 0..repeat {
                rows.push(build_row(&lanes, rows.len(), header));
            }
        }

        for (lane, delta) in deltas {
            lanes[lane] += delta;
        }
        rows.push(build_row(&lanes, rows.len(), header));
    }

    if data[cursor.pos..end].iter().any(|&b| b != 0) {
        return Err(DecodeError::CorruptRecord {
            offset: cursor.pos,
            reason: "trailing bytes after the last record",
        });
    }

    trace!("flight {}: {} samples", header.number, rows.len());
    Ok(rows)
}

fn build_row(lanes: &[i64], index: usize, header: &FlightHeader) -> FlightSampleRow {
    let at = header.start + Duration::seconds(index as i64 * header.interval_secs as i64);
    let mut row = FlightSampleRow::new();
    row.set(FieldTag::Date, at.format(DATE_FORMAT).to_string());
    row.set(FieldTag::Time, at.format(TIME_FORMAT).to_string());

    // A 0/0 position is what the recorder stores while the GPS has no fix
    let no_fix = header.flags & FLAG_GPS != 0
        && FIELDS
            .iter()
            .filter(|f| matches!(f.render, Render::Coordinate(_)))
            .all(|f| f.value(lanes) == 0);

    for field in FIELDS.iter().filter(|f| f.recorded(header.flags)) {
        let value = field.value(lanes);
        let rendered = match field.render {
            Render::Coordinate(_) if no_fix => String::new(),
            _ => field.render(value),
        };
        row.set(field.tag, rendered);
    }
    row
}
