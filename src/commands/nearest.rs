use anyhow::{Result, anyhow};
use serde::Serialize;
use std::io::Write;

use jpi_logbook::airports::Airport;
use jpi_logbook::coordinates::parse_coordinate;
use jpi_logbook::gazetteer::{GazetteerSources, load_airports_from, nearest_airport_with_distance};

use super::write_json;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NearestMatch<'a> {
    #[serde(flatten)]
    airport: &'a Airport,
    code: &'a str,
    distance_km: f64,
}

/// Decimal degrees, or a recorder-style `N37.38.45` coordinate
fn parse_position_arg(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .or_else(|| parse_coordinate(raw))
        .ok_or_else(|| anyhow!("{:?} is neither decimal degrees nor a recorder coordinate", raw))
}

/// Print the nearest airport within `max_km`, or `null`
pub fn handle_nearest(
    lat: &str,
    lng: &str,
    sources: &GazetteerSources,
    max_km: f64,
    out: &mut dyn Write,
) -> Result<()> {
    let lat = parse_position_arg(lat)?;
    let lng = parse_position_arg(lng)?;
    let gazetteer = load_airports_from(sources)?;

    let found = nearest_airport_with_distance(lat, lng, gazetteer.airports(), Some(max_km)).map(
        |(airport, distance_km)| NearestMatch {
            airport,
            code: airport.logbook_code(),
            distance_km: (distance_km * 100.0).round() / 100.0,
        },
    );
    write_json(out, &found)
}
