//! Writer for EDM-format logs, the inverse of the decoder.
//!
//! Used to build fixture logs and by tooling that needs synthetic recordings.
//! Values are given in the raw integer units the recorder stores (tenths for
//! MAP/FF/VOLT, hundredths of an hour for TACH/HOBBS, hundredths of a minute
//! for LAT/LNG).

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use thiserror::Error;

use super::consts::{FIELD_FLAG_BYTES, FLAG_GPS, FLAG_HOURS, LANE_COUNT};
use super::fields::layout;
use super::flight::pack_timestamp;
use super::header::{format_header_line, header_checksum};
use crate::coordinates::to_hundredths_of_minute;
use crate::samples::FieldTag;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{0} is not a recorded field")]
    UnsupportedField(FieldTag),
    #[error("{tag} value {value} does not fit its lanes")]
    ValueOutOfRange { tag: FieldTag, value: i64 },
    #[error("flight {flight}: change of {tag} after sample {sample} is too large")]
    DeltaTooLarge {
        flight: u32,
        tag: FieldTag,
        sample: usize,
    },
    #[error("flight {0}: start time cannot be stored")]
    StartOutOfRange(u32),
    #[error("flight number {0} does not fit in 16 bits")]
    FlightNumberOutOfRange(u32),
    #[error("flight {0}: sample interval must be 1..=65535 seconds")]
    InvalidInterval(u32),
    #[error("header text {0:?} contains reserved characters")]
    InvalidHeaderText(String),
}

/// Field values of one sample. Fields not set keep their previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleValues {
    values: BTreeMap<FieldTag, i64>,
}

impl SampleValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: FieldTag, raw: i64) -> Self {
        self.values.insert(tag, raw);
        self
    }

    /// Set LAT/LNG from decimal degrees
    pub fn with_position(self, lat: f64, lng: f64) -> Self {
        self.with(FieldTag::Lat, to_hundredths_of_minute(lat))
            .with(FieldTag::Lng, to_hundredths_of_minute(lng))
    }

    /// Set TACH/HOBBS from hours
    pub fn with_hours(self, tach: f64, hobbs: f64) -> Self {
        self.with(FieldTag::Tach, (tach * 100.0).round() as i64)
            .with(FieldTag::Hobbs, (hobbs * 100.0).round() as i64)
    }

    pub fn get(&self, tag: FieldTag) -> Option<i64> {
        self.values.get(&tag).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlightRecording {
    pub recorder_number: u32,
    pub interval_secs: u32,
    pub start: NaiveDateTime,
    pub samples: Vec<SampleValues>,
}

impl FlightRecording {
    pub fn new(recorder_number: u32, start: NaiveDateTime, interval_secs: u32) -> Self {
        Self {
            recorder_number,
            interval_secs,
            start,
            samples: Vec::new(),
        }
    }

    pub fn sample(mut self, sample: SampleValues) -> Self {
        self.samples.push(sample);
        self
    }

    /// GPS and hour-meter flags, set when any sample carries those fields
    fn effective_flags(&self) -> u32 {
        let mut flags = 0;
        for s in &self.samples {
            if s.get(FieldTag::Lat).is_some() || s.get(FieldTag::Lng).is_some() {
                flags |= FLAG_GPS;
            }
            if s.get(FieldTag::Tach).is_some() || s.get(FieldTag::Hobbs).is_some() {
                flags |= FLAG_HOURS;
            }
        }
        flags
    }

    /// Encode the flight block: flight header, records, zero padding to a word
    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let number = u16::try_from(self.recorder_number)
            .map_err(|_| EncodeError::FlightNumberOutOfRange(self.recorder_number))?;
        let interval = u16::try_from(self.interval_secs)
            .ok()
            .filter(|&i| i > 0)
            .ok_or(EncodeError::InvalidInterval(self.interval_secs))?;
        let (date, time) =
            pack_timestamp(self.start).ok_or(EncodeError::StartOutOfRange(self.recorder_number))?;
        let flags = self.effective_flags();

        let mut out = Vec::new();
        out.extend_from_slice(&number.to_be_bytes());
        out.extend_from_slice(&flags.to_be_bytes());
        out.extend_from_slice(&interval.to_be_bytes());
        out.extend_from_slice(&date.to_be_bytes());
        out.extend_from_slice(&time.to_be_bytes());
        out.push(header_checksum(&out));

        let mut current = [0i64; LANE_COUNT];
        let mut target = [0i64; LANE_COUNT];
        let mut pending_repeats = 0usize;

        for (n, sample) in self.samples.iter().enumerate() {
            for (&tag, &value) in &sample.values {
                let field = layout(tag).ok_or(EncodeError::UnsupportedField(tag))?;
                let parts = field
                    .split(value)
                    .ok_or(EncodeError::ValueOutOfRange { tag, value })?;
                for (&lane, part) in field.lanes.iter().zip(parts) {
                    target[lane as usize] = part;
                }
            }

            let mut deltas = [0i64; LANE_COUNT];
            for lane in 0..LANE_COUNT {
                deltas[lane] = target[lane] - current[lane];
                if deltas[lane].abs() > 255 {
                    let tag = field_of_lane(lane).unwrap_or(FieldTag::Alt);
                    return Err(EncodeError::DeltaTooLarge {
                        flight: self.recorder_number,
                        tag,
                        sample: n.saturating_sub(1),
                    });
                }
            }

            if n > 0 && deltas.iter().all(|&d| d == 0) {
                pending_repeats += 1;
                if pending_repeats == 256 {
                    write_record(&mut out, 255, &deltas);
                    pending_repeats = 0;
                }
                continue;
            }

            write_record(&mut out, pending_repeats as u8, &deltas);
            pending_repeats = 0;
            current = target;
        }

        if pending_repeats > 0 {
            write_record(&mut out, (pending_repeats - 1) as u8, &[0; LANE_COUNT]);
        }

        if out.len() % 2 == 1 {
            out.push(0);
        }
        Ok(out)
    }
}

fn field_of_lane(lane: usize) -> Option<FieldTag> {
    super::fields::FIELDS
        .iter()
        .find(|f| f.lanes.iter().any(|&l| l as usize == lane))
        .map(|f| f.tag)
}

fn write_record(out: &mut Vec<u8>, repeat: u8, deltas: &[i64; LANE_COUNT]) {
    let start = out.len();
    let mut field_flags = [0u8; FIELD_FLAG_BYTES];
    let mut sign_flags = [0u8; FIELD_FLAG_BYTES];
    for (lane, &delta) in deltas.iter().enumerate() {
        if delta != 0 {
            field_flags[lane / 8] |= 1 << (lane % 8);
            if delta < 0 {
                sign_flags[lane / 8] |= 1 << (lane % 8);
            }
        }
    }

    let decode_flags = field_flags
        .iter()
        .enumerate()
        .filter(|(_, f)| **f != 0)
        .fold(0u16, |acc, (i, _)| acc | (1 << i));

    out.extend_from_slice(&decode_flags.to_be_bytes());
    out.extend_from_slice(&decode_flags.to_be_bytes());
    out.push(repeat);
    out.extend(field_flags.iter().copied().filter(|&f| f != 0));
    out.extend(
        field_flags
            .iter()
            .zip(sign_flags.iter())
            .filter(|(f, _)| **f != 0)
            .map(|(_, s)| *s),
    );
    out.extend(
        deltas
            .iter()
            .filter(|&&d| d != 0)
            .map(|d| d.unsigned_abs() as u8),
    );
    let checksum = header_checksum(&out[start..]);
    out.push(checksum);
}

const RECORDER_MODEL: &str = "930";
const PROTOCOL_VERSION: u32 = 2;

/// Assembles a complete log: ASCII header followed by the flight blocks
#[derive(Debug, Clone)]
pub struct LogBuilder {
    tail_number: String,
    flights: Vec<FlightRecording>,
}

impl LogBuilder {
    pub fn new(tail_number: impl Into<String>) -> Self {
        Self {
            tail_number: tail_number.into(),
            flights: Vec::new(),
        }
    }

    pub fn flight(mut self, flight: FlightRecording) -> Self {
        self.flights.push(flight);
        self
    }

    pub fn build(&self) -> Result<Vec<u8>, EncodeError> {
        let tail = &self.tail_number;
        if !tail.is_ascii() || tail.contains([',', '*', '$', '\r', '\n']) {
            return Err(EncodeError::InvalidHeaderText(tail.clone()));
        }

        let blocks = self
            .flights
            .iter()
            .map(FlightRecording::encode)
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = String::new();
        out.push_str(&format_header_line(&format!("U,{}", self.tail_number)));
        out.push_str(&format_header_line(&format!("C,{}", RECORDER_MODEL)));
        out.push_str(&format_header_line(&format!("P,{}", PROTOCOL_VERSION)));
        for (flight, block) in self.flights.iter().zip(&blocks) {
            out.push_str(&format_header_line(&format!(
                "D,{},{}",
                flight.recorder_number,
                block.len() / 2
            )));
        }
        out.push_str(&format_header_line("L,0"));

        let mut bytes = out.into_bytes();
        for block in blocks {
            bytes.extend(block);
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpi::{decode_flight, parse_log};
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 8, 19)
            .unwrap()
            .and_hms_opt(17, 2, 10)
            .unwrap()
    }

    #[test]
    fn test_empty_log_has_no_flights() {
        let bytes = LogBuilder::new("N1").build().unwrap();
        assert!(parse_log(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_position_and_hours_set_flags() {
        let recording = FlightRecording::new(5, start(), 6)
            .sample(SampleValues::new().with_position(37.6408, -122.098).with_hours(1234.5, 2000.0));
        assert_eq!(recording.effective_flags(), FLAG_GPS | FLAG_HOURS);

        let bytes = LogBuilder::new("N1").flight(recording).build().unwrap();
        let rows = decode_flight(&bytes, 1).unwrap();
        assert_eq!(rows[0].get(FieldTag::Lat), Some("N37.38.45"));
        assert_eq!(rows[0].get(FieldTag::Lng), Some("W122.05.88"));
        assert_eq!(rows[0].get(FieldTag::Tach), Some("1234.50"));
        assert_eq!(rows[0].get(FieldTag::Hobbs), Some("2000.00"));
    }

    #[test]
    fn test_long_runs_of_identical_samples() {
        let mut recording =
            FlightRecording::new(9, start(), 1).sample(SampleValues::new().with(FieldTag::Rpm, 2400));
        for _ in 0..600 {
            recording = recording.sample(SampleValues::new());
        }
        recording = recording.sample(SampleValues::new().with(FieldTag::Rpm, 2450));
        for _ in 0..3 {
            recording = recording.sample(SampleValues::new());
        }

        let bytes = LogBuilder::new("N1").flight(recording).build().unwrap();
        let rows = decode_flight(&bytes, 1).unwrap();
        assert_eq!(rows.len(), 605);
        assert_eq!(rows[600].get(FieldTag::Rpm), Some("2400"));
        assert_eq!(rows[601].get(FieldTag::Rpm), Some("2450"));
        assert_eq!(rows[604].get(FieldTag::Rpm), Some("2450"));
        assert_eq!(rows[604].get(FieldTag::Time), Some("17:12:14"));
    }

    #[test]
    fn test_rejects_values_that_do_not_fit() {
        let recording = FlightRecording::new(1, start(), 6)
            .sample(SampleValues::new().with(FieldTag::Oat, 300));
        assert_eq!(
            LogBuilder::new("N1").flight(recording).build(),
            Err(EncodeError::ValueOutOfRange {
                tag: FieldTag::Oat,
                value: 300
            })
        );

        let recording = FlightRecording::new(1, start(), 6)
            .sample(SampleValues::new().with(FieldTag::TimeOff, 1));
        assert_eq!(
            LogBuilder::new("N1").flight(recording).build(),
            Err(EncodeError::UnsupportedField(FieldTag::TimeOff))
        );
    }

    #[test]
    fn test_rejects_unstorable_headers() {
        let recording = FlightRecording::new(70_000, start(), 6);
        assert_eq!(
            LogBuilder::new("N1").flight(recording).build(),
            Err(EncodeError::FlightNumberOutOfRange(70_000))
        );

        let recording = FlightRecording::new(1, start(), 0);
        assert_eq!(
            LogBuilder::new("N1").flight(recording).build(),
            Err(EncodeError::InvalidInterval(0))
        );

        let old = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            LogBuilder::new("N1")
                .flight(FlightRecording::new(1, old, 6))
                .build(),
            Err(EncodeError::StartOutOfRange(1))
        );

        assert!(matches!(
            LogBuilder::new("N1,2").build(),
            Err(EncodeError::InvalidHeaderText(_))
        ));
    }

    #[test]
    fn test_blocks_are_word_aligned() {
        let bytes = LogBuilder::new("N1")
            .flight(FlightRecording::new(1, start(), 6).sample(SampleValues::new()))
            .build()
            .unwrap();
        let index = parse_log(&bytes).unwrap();
        assert_eq!(index[0].size_bytes % 2, 0);
        assert_eq!(index[0].offset + index[0].size_bytes, bytes.len());
    }
}
