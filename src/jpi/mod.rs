//! JPI / EDM engine-monitor logs.
//!
//! A log is an ASCII header (see [`header`]) followed by one binary block per
//! stored flight. [`parse_log`] lists the flights; [`decode_flight`] turns one
//! of them into sample rows.

pub mod consts;
pub mod encode;
pub mod error;
pub mod fields;
pub mod flight;
pub mod header;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::debug;

pub use encode::{EncodeError, FlightRecording, LogBuilder, SampleValues};
pub use error::DecodeError;
pub use flight::FlightHeader;
pub use header::{DirectoryEntry, LogHeader};

use crate::samples::FlightSampleRow;
use consts::FLIGHT_HEADER_SIZE;

/// One flight stored in a log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightIndexEntry {
    /// 1-based position in the log, in recording order
    pub id: u32,
    /// Flight number assigned by the recorder
    pub recorder_number: u32,
    #[serde(rename = "offsetIntoStream")]
    pub offset: usize,
    pub size_bytes: usize,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub interval_secs: u32,
    #[serde(skip)]
    pub flags: u32,
}

/// A parsed log borrowing its input buffer
#[derive(Debug, Clone)]
pub struct JpiLog<'a> {
    data: &'a [u8],
    header: LogHeader,
    index: Vec<FlightIndexEntry>,
}

impl<'a> JpiLog<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, DecodeError> {
        let header = header::parse_header(data)?;
        let mut index = Vec::with_capacity(header.directory.len());
        let mut offset = header.data_offset;

        for (position, entry) in header.directory.iter().enumerate() {
            let size_bytes = entry.size_words as usize * 2;
            let end = offset + size_bytes;
            if end > data.len() || size_bytes < FLIGHT_HEADER_SIZE {
                return Err(DecodeError::UnexpectedEof(data.len().min(end)));
            }
            let fh = flight::read_flight_header(data, offset, end, entry.flight)?;
            index.push(FlightIndexEntry {
                id: position as u32 + 1,
                recorder_number: fh.number,
                offset,
                size_bytes,
                start_date: fh.start.date(),
                start_time: fh.start.time(),
                interval_secs: fh.interval_secs,
                flags: fh.flags,
            });
            offset = end;
        }

        debug!(
            "parsed log header: tail={:?} model={:?} flights={}",
            header.tail_number,
            header.model,
            index.len()
        );
        Ok(Self {
            data,
            header,
            index,
        })
    }

    pub fn header(&self) -> &LogHeader {
        &self.header
    }

    pub fn index(&self) -> &[FlightIndexEntry] {
        &self.index
    }

    pub fn flight(&self, id: u32) -> Option<&FlightIndexEntry> {
        self.index.iter().find(|e| e.id == id)
    }

    pub fn decode_flight(&self, id: u32) -> Result<Vec<FlightSampleRow>, DecodeError> {
        let entry = self.flight(id).ok_or(DecodeError::FlightNotFound(id))?;
        let end = entry.offset + entry.size_bytes;
        let fh = flight::read_flight_header(self.data, entry.offset, end, entry.recorder_number)?;
        match flight::decode_records(self.data, entry.offset, end, &fh) {
            Ok(rows) => {
                metrics::counter!("jpi.flights_decoded_total").increment(1);
                debug!("decoded flight {} ({} samples)", id, rows.len());
                Ok(rows)
            }
            Err(e) => {
                metrics::counter!("jpi.decode_errors_total").increment(1);
                Err(e)
            }
        }
    }
}

/// Something that can list and decode the flights of an engine-monitor log
pub trait FlightLogDecoder: Send + Sync {
    fn parse_log(&self, bytes: &[u8]) -> Result<Vec<FlightIndexEntry>, DecodeError>;

    fn decode_flight(&self, bytes: &[u8], flight_id: u32)
    -> Result<Vec<FlightSampleRow>, DecodeError>;
}

/// Decoder for EDM-format logs
#[derive(Debug, Clone, Copy, Default)]
pub struct EdmDecoder;

impl FlightLogDecoder for EdmDecoder {
    fn parse_log(&self, bytes: &[u8]) -> Result<Vec<FlightIndexEntry>, DecodeError> {
        parse_log(bytes)
    }

    fn decode_flight(
        &self,
        bytes: &[u8],
        flight_id: u32,
    ) -> Result<Vec<FlightSampleRow>, DecodeError> {
        decode_flight(bytes, flight_id)
    }
}

/// List the flights stored in a log
pub fn parse_log(bytes: &[u8]) -> Result<Vec<FlightIndexEntry>, DecodeError> {
    JpiLog::parse(bytes).map(|log| log.index)
}

/// Decode one flight (by 1-based id) into its sample rows
pub fn decode_flight(bytes: &[u8], flight_id: u32) -> Result<Vec<FlightSampleRow>, DecodeError> {
    JpiLog::parse(bytes)?.decode_flight(flight_id)
}
