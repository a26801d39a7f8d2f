//! Departure and arrival airports for summarized flights.

use serde::Serialize;
use tracing::debug;

use crate::airports::Airport;
use crate::coordinates::parse_coordinate;
use crate::gazetteer::nearest_airport;
use crate::summary::FlightSummary;

/// Airport codes at either end of a flight (IATA when the airport has one, else ICAO)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AirportAttribution {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

/// Match a flight's first and last fixes against `airports` within `max_km`
pub fn attribute(summary: &FlightSummary, airports: &[Airport], max_km: f64) -> AirportAttribution {
    let from = code_near(
        summary.start_lat.as_deref(),
        summary.start_lng.as_deref(),
        airports,
        max_km,
    );
    let to = code_near(
        summary.end_lat.as_deref(),
        summary.end_lng.as_deref(),
        airports,
        max_km,
    );
    debug!("flight {}: from={:?} to={:?}", summary.id, from, to);
    AirportAttribution { from, to }
}

fn code_near(
    lat: Option<&str>,
    lng: Option<&str>,
    airports: &[Airport],
    max_km: f64,
) -> Option<String> {
    let lat = parse_coordinate(lat?)?;
    let lng = parse_coordinate(lng?)?;
    nearest_airport(lat, lng, airports, Some(max_km)).map(|a| a.logbook_code().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn airport(icao: &str, iata: Option<&str>, lat: f64, lng: f64) -> Airport {
        Airport {
            icao: icao.to_string(),
            iata: iata.map(str::to_string),
            name: icao.to_string(),
            lat,
            lng,
        }
    }

    fn airports() -> Vec<Airport> {
        vec![
            airport("KSQL", Some("SQL"), 37.5119, -122.2495),
            airport("KNUQ", None, 37.4161, -122.0491),
            airport("KSMF", Some("SMF"), 38.6953, -121.5908),
        ]
    }

    fn summary(start: (&str, &str), end: (&str, &str)) -> FlightSummary {
        FlightSummary {
            id: 1,
            start_lat: Some(start.0.into()),
            start_lng: Some(start.1.into()),
            end_lat: Some(end.0.into()),
            end_lng: Some(end.1.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_prefers_iata_and_falls_back_to_icao() {
        // N37.30.71 W122.14.97 is on the San Carlos field; N37.25.00 W122.03.00 near Moffett
        let s = summary(("N37.30.71", "W122.14.97"), ("N37.25.00", "W122.03.00"));
        let a = attribute(&s, &airports(), 10.0);
        assert_eq!(a.from.as_deref(), Some("SQL"));
        assert_eq!(a.to.as_deref(), Some("KNUQ"));
    }

    #[test]
    fn test_outside_radius_is_unset() {
        // Lake Tahoe: every airport above is more than 10 km away
        let s = summary(("N39.05.00", "W120.02.00"), ("N39.05.00", "W120.02.00"));
        assert_eq!(attribute(&s, &airports(), 10.0), AirportAttribution::default());
        assert!(attribute(&s, &airports(), 500.0).from.is_some());
    }

    #[test]
    fn test_missing_or_bad_fixes_are_unset() {
        let s = FlightSummary::default();
        assert_eq!(attribute(&s, &airports(), 10.0), AirportAttribution::default());

        let s = summary(("X", "W122.14.97"), ("N38.41.72", "W121.35.45"));
        let a = attribute(&s, &airports(), 10.0);
        assert_eq!(a.from, None);
        assert_eq!(a.to.as_deref(), Some("SMF"));
    }
}
