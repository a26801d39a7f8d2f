//! Per-sample rows of a decoded flight and typed access to their fields.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;
use thiserror::Error;

use crate::coordinates::parse_coordinate;

/// Time-of-day format used by the recorder and in summaries
pub const TIME_FORMAT: &str = "%H:%M:%S";
/// Calendar date format used by the recorder
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Known sample-row field tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldTag {
    Date,
    Time,
    /// Decoder-supplied engine start ("time off") time
    TimeOff,
    /// Decoder-supplied engine stop ("time in") time
    TimeIn,
    E1,
    E2,
    E3,
    E4,
    E5,
    E6,
    C1,
    C2,
    C3,
    C4,
    C5,
    C6,
    Oat,
    OilTemp,
    OilPressure,
    ManifoldPressure,
    Rpm,
    FuelFlow,
    Volts,
    Speed,
    Alt,
    Lat,
    Lng,
    /// Tach hour meter, hours
    Tach,
    /// Hobbs hour meter, hours
    Hobbs,
}

impl FieldTag {
    /// All tags in column order
    pub const ALL: [FieldTag; 29] = [
        FieldTag::Date,
        FieldTag::Time,
        FieldTag::TimeOff,
        FieldTag::TimeIn,
        FieldTag::E1,
        FieldTag::E2,
        FieldTag::E3,
        FieldTag::E4,
        FieldTag::E5,
        FieldTag::E6,
        FieldTag::C1,
        FieldTag::C2,
        FieldTag::C3,
        FieldTag::C4,
        FieldTag::C5,
        FieldTag::C6,
        FieldTag::Oat,
        FieldTag::OilTemp,
        FieldTag::OilPressure,
        FieldTag::ManifoldPressure,
        FieldTag::Rpm,
        FieldTag::FuelFlow,
        FieldTag::Volts,
        FieldTag::Speed,
        FieldTag::Alt,
        FieldTag::Lat,
        FieldTag::Lng,
        FieldTag::Tach,
        FieldTag::Hobbs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldTag::Date => "DATE",
            FieldTag::Time => "TIME",
            FieldTag::TimeOff => "T_OFF",
            FieldTag::TimeIn => "T_IN",
            FieldTag::E1 => "E1",
            FieldTag::E2 => "E2",
            FieldTag::E3 => "E3",
            FieldTag::E4 => "E4",
            FieldTag::E5 => "E5",
            FieldTag::E6 => "E6",
            FieldTag::C1 => "C1",
            FieldTag::C2 => "C2",
            FieldTag::C3 => "C3",
            FieldTag::C4 => "C4",
            FieldTag::C5 => "C5",
            FieldTag::C6 => "C6",
            FieldTag::Oat => "OAT",
            FieldTag::OilTemp => "OILT",
            FieldTag::OilPressure => "OILP",
            FieldTag::ManifoldPressure => "MAP",
            FieldTag::Rpm => "RPM",
            FieldTag::FuelFlow => "FF",
            FieldTag::Volts => "VOLT",
            FieldTag::Speed => "SPD",
            FieldTag::Alt => "ALT",
            FieldTag::Lat => "LAT",
            FieldTag::Lng => "LNG",
            FieldTag::Tach => "TACH",
            FieldTag::Hobbs => "HOBBS",
        }
    }

    fn column_rank(name: &str) -> Option<usize> {
        FieldTag::ALL.iter().position(|t| t.as_str() == name)
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown field tag '{0}'")]
pub struct UnknownFieldTag(pub String);

impl FromStr for FieldTag {
    type Err = UnknownFieldTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        FieldTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(t))
            .ok_or_else(|| UnknownFieldTag(t.to_string()))
    }
}

/// One recorded sample tick: field tag -> raw string value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightSampleRow {
    fields: BTreeMap<String, String>,
}

impl FlightSampleRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(tag.into(), value.into());
    }

    pub fn set(&mut self, tag: FieldTag, value: impl Into<String>) {
        self.fields.insert(tag.as_str().to_string(), value.into());
    }

    /// Raw value by arbitrary tag name, exact match first then case-insensitive
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }

    /// Trimmed value of a known tag; blank values count as absent
    pub fn get(&self, tag: FieldTag) -> Option<&str> {
        self.get_raw(tag.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn get_f64(&self, tag: FieldTag) -> Option<f64> {
        self.get(tag)?.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    pub fn get_time(&self, tag: FieldTag) -> Option<NaiveTime> {
        parse_time(self.get(tag)?)
    }

    pub fn altitude(&self) -> Option<f64> {
        self.get_f64(FieldTag::Alt)
    }

    /// Decoded GPS fix, only when both axes parse
    pub fn position(&self) -> Option<(f64, f64)> {
        let lat = parse_coordinate(self.get(FieldTag::Lat)?)?;
        let lng = parse_coordinate(self.get(FieldTag::Lng)?)?;
        Some((lat, lng))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parse `HH:MM:SS` or `HH:MM`; missing seconds count as zero
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let t = s.trim();
    NaiveTime::parse_from_str(t, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
        .ok()
}

/// One point of a flight's track, as plotted by the flight view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPoint {
    pub index: usize,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

/// Altitude and position series for a decoded flight
pub fn track(rows: &[FlightSampleRow]) -> Vec<TrackPoint> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let position = row.position();
            TrackPoint {
                index,
                time: row.get(FieldTag::Time).unwrap_or_default().to_string(),
                altitude: row.altitude(),
                lat: position.map(|(lat, _)| lat),
                lng: position.map(|(_, lng)| lng),
            }
        })
        .collect()
}

/// Column order for a set of rows: known tags first, then unknown tags alphabetically
fn columns(rows: &[FlightSampleRow]) -> Vec<String> {
    let mut names: Vec<&String> = rows.iter().flat_map(|r| r.fields.keys()).collect();
    names.sort_by(|a, b| {
        match (FieldTag::column_rank(a), FieldTag::column_rank(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
    names.dedup();
    names.into_iter().cloned().collect()
}

/// Write rows as CSV with a header line
pub fn write_csv<W: Write>(rows: &[FlightSampleRow], writer: W) -> Result<(), csv::Error> {
    let headers = columns(rows);
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&headers)?;
    for row in rows {
        out.write_record(headers.iter().map(|h| row.get_raw(h).unwrap_or("")))?;
    }
    out.flush()?;
    Ok(())
}

/// Read CSV rows (header line required). Headers are trimmed, empty cells are
/// left out of the row.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<FlightSampleRow>, csv::Error> {
    let mut input = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = input.headers()?.clone();

    let mut rows = Vec::new();
    for record in input.records() {
        let record = record?;
        let mut row = FlightSampleRow::new();
        for (name, value) in headers.iter().zip(record.iter()) {
            if !name.is_empty() && !value.is_empty() {
                row.insert(name, value);
            }
        }
        rows.push(row);
    }
    Ok(rows)
}
