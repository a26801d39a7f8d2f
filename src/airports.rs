use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Accepted spellings for each airport attribute, in lookup order
const CODE_KEYS: &[&str] = &["icao", "ICAO", "gps_code", "ident"];
const IATA_KEYS: &[&str] = &["iata", "IATA", "iata_code"];
const NAME_KEYS: &[&str] = &["name", "Name"];
const LAT_KEYS: &[&str] = &["lat", "latitude", "Latitude", "latitude_deg"];
const LNG_KEYS: &[&str] = &["lng", "lon", "longitude", "Longitude", "longitude_deg"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub icao: String, // ICAO (or local ident) code, unique key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iata: Option<String>, // IATA code when the airport has one
    pub name: String, // Airport name
    pub lat: f64,     // Latitude in decimal degrees
    pub lng: f64,     // Longitude in decimal degrees
}

impl Airport {
    /// Identifier written into logbook entries: IATA when present, else ICAO
    pub fn logbook_code(&self) -> &str {
        self.iata.as_deref().unwrap_or(&self.icao)
    }
}

fn to_opt_string(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn value_to_opt_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => to_opt_string(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_opt_f64(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                return None;
            }
            t.parse::<f64>().ok()
        }
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn first_string(rec: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| rec.get(*k))
        .find_map(value_to_opt_string)
}

fn first_f64(rec: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| rec.get(*k)).find_map(value_to_opt_f64)
}

/// Normalize one loosely-keyed airport record.
///
/// Returns `None` unless the record has a non-empty code and finite
/// coordinates; invalid records never reach a gazetteer.
pub fn normalize_record(rec: &Map<String, Value>) -> Option<Airport> {
    let icao = first_string(rec, CODE_KEYS)?;
    let lat = first_f64(rec, LAT_KEYS)?;
    let lng = first_f64(rec, LNG_KEYS)?;
    let iata = first_string(rec, IATA_KEYS);
    let name = first_string(rec, NAME_KEYS).unwrap_or_default();

    Some(Airport {
        icao,
        iata,
        name,
        lat,
        lng,
    })
}

/// Parse a JSON airport dataset: either a top-level array of records or an
/// object with an `airports` array. Invalid records are skipped.
pub fn parse_airports_json(text: &str) -> serde_json::Result<Vec<Airport>> {
    let parsed: Value = serde_json::from_str(text)?;
    let records = match &parsed {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("airports") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    let airports: Vec<Airport> = records
        .iter()
        .filter_map(Value::as_object)
        .filter_map(normalize_record)
        .collect();

    if airports.len() < records.len() {
        debug!(
            "Dropped {} invalid airport records out of {}",
            records.len() - airports.len(),
            records.len()
        );
    }

    Ok(airports)
}

/// Read and normalize a JSON airport dataset from disk
pub fn read_airports_json_file<P: AsRef<Path>>(path: P) -> Result<Vec<Airport>> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Opening {:?}", path.as_ref()))?;
    parse_airports_json(&text).with_context(|| format!("Parsing JSON {:?}", path.as_ref()))
}

/// Read an OurAirports-style CSV file, keyed by its header row.
///
/// Rows are normalized with the same key rules as JSON records, so both
/// `ident`/`latitude_deg`/`longitude_deg` exports and hand-made
/// `icao,name,lat,lng` files work. Rows without a code or coordinates are skipped.
pub fn read_airports_csv_file<P: AsRef<Path>>(path: P) -> Result<Vec<Airport>> {
    let f = File::open(path.as_ref()).with_context(|| format!("Opening {:?}", path.as_ref()))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(f));

    let mut out = Vec::new();
    for (lineno, row) in reader.deserialize::<HashMap<String, String>>().enumerate() {
        // +2: header line plus 1-based numbering
        let row = row.with_context(|| format!("Parsing CSV line {}", lineno + 2))?;
        let rec: Map<String, Value> = row
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        if let Some(airport) = normalize_record(&rec) {
            out.push(airport);
        }
    }

    Ok(out)
}

/// Convert a CSV or JSON airport dataset into the normalized JSON form used
/// by the gazetteer. Output is sorted by code. Returns the number written.
pub fn convert_airports(input: &Path, dest: &Path) -> Result<usize> {
    let is_json = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let mut airports = if is_json {
        read_airports_json_file(input)?
    } else {
        read_airports_csv_file(input)?
    };
    airports.sort_by(|a, b| a.icao.cmp(&b.icao));

    let json = serde_json::to_string_pretty(&airports)?;
    std::fs::write(dest, json).with_context(|| format!("Writing {:?}", dest))?;

    info!("Wrote {} airports to {:?}", airports.len(), dest);
    Ok(airports.len())
}
