//! Per-flight summaries derived from decoded sample rows.

use chrono::Duration;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::jpi::{DecodeError, FlightLogDecoder};
use crate::samples::{FieldTag, FlightSampleRow, TIME_FORMAT, parse_time};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSummary {
    pub id: u32,
    /// `MM/DD/YYYY HH:MM:SS` of the first sample
    pub date_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_off: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tach_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hobb_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_lat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_lng: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_lat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_lng: Option<String>,
}

impl FlightSummary {
    /// Tach time if recorded, else Hobbs time
    pub fn duration(&self) -> Option<f64> {
        self.tach_duration.or(self.hobb_duration)
    }
}

/// Summarize one flight's rows
pub fn summarize(id: u32, rows: &[FlightSampleRow]) -> FlightSummary {
    let Some(first) = rows.first() else {
        return FlightSummary {
            id,
            ..Default::default()
        };
    };

    let date_time = [first.get(FieldTag::Date), first.get(FieldTag::Time)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    let time_off = first
        .get(FieldTag::TimeOff)
        .or_else(|| first.get(FieldTag::Time))
        .map(str::to_string);

    let tach_duration = meter_delta(rows, FieldTag::Tach);
    let hobb_duration = meter_delta(rows, FieldTag::Hobbs);
    let duration = tach_duration.or(hobb_duration);

    let time_in = rows
        .last()
        .and_then(|r| r.get(FieldTag::TimeIn))
        .map(str::to_string)
        .or_else(|| compute_time_in(time_off.as_deref()?, duration?));

    let start_fix = rows.iter().find(|r| r.position().is_some());
    let end_fix = rows.iter().rev().find(|r| r.position().is_some());
    let raw = |row: Option<&FlightSampleRow>, tag| {
        row.and_then(|r| r.get(tag)).map(str::to_string)
    };

    FlightSummary {
        id,
        date_time,
        time_off,
        time_in,
        tach_duration,
        hobb_duration,
        start_lat: raw(start_fix, FieldTag::Lat),
        start_lng: raw(start_fix, FieldTag::Lng),
        end_lat: raw(end_fix, FieldTag::Lat),
        end_lng: raw(end_fix, FieldTag::Lng),
    }
}

/// Hours elapsed on an hour meter: last reading minus first, to 0.01 h
fn meter_delta(rows: &[FlightSampleRow], tag: FieldTag) -> Option<f64> {
    let first = rows.iter().find_map(|r| r.get_f64(tag))?;
    let last = rows.iter().rev().find_map(|r| r.get_f64(tag))?;
    Some(((last - first) * 100.0).round() / 100.0)
}

/// Longest meter delta turned into a landing time; larger readings are meter faults
const MAX_DURATION_SECS: f64 = 1_000.0 * 3600.0;

/// `time_off` plus `hours`, rounded to the second and wrapped past midnight.
///
/// Returns `None` for an unparseable start or a negative, non-finite or
/// implausibly long duration.
pub fn compute_time_in(time_off: &str, hours: f64) -> Option<String> {
    if !hours.is_finite() || hours < 0.0 {
        return None;
    }
    let start = parse_time(time_off)?;
    let seconds = (hours * 3600.0).round();
    if seconds > MAX_DURATION_SECS {
        return None;
    }
    let elapsed = Duration::try_seconds(seconds as i64)?;
    let end = start.overflowing_add_signed(elapsed).0;
    Some(end.format(TIME_FORMAT).to_string())
}

/// Decode and summarize every flight of a log, in index order
pub fn summarize_log(
    decoder: &dyn FlightLogDecoder,
    bytes: &[u8],
) -> Result<Vec<FlightSummary>, DecodeError> {
    let index = decoder.parse_log(bytes)?;
    debug!("summarizing {} flights", index.len());

    index
        .par_iter()
        .map(|entry| {
            let rows = decoder.decode_flight(bytes, entry.id)?;
            Ok(summarize(entry.id, &rows))
        })
        .collect()
}
