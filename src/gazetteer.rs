//! Airport gazetteer: the reference airport set and nearest-airport queries.
//!
//! The process-wide set is loaded lazily on first use and never invalidated.
//! Candidate sources are tried in order (configured path, `data/airports.json`,
//! `public/airports/airports.json` under the project root); the first one that
//! parses to at least one valid airport wins. When none does, the dataset
//! compiled into the binary is used.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::airports::{Airport, parse_airports_json};
use crate::coordinates::haversine_distance_km;

/// Environment variable naming an explicit airport dataset
pub const AIRPORTS_PATH_ENV: &str = "AIRPORTS_JSON_PATH";

/// Default radius within which a GPS fix is attributed to an airport
pub const DEFAULT_MATCH_RADIUS_KM: f64 = 10.0;

static BUNDLED_AIRPORTS_JSON: &str = include_str!("../data/airports.json");

static AIRPORTS_CACHE: OnceLock<Gazetteer> = OnceLock::new();

#[derive(Error, Debug)]
pub enum GazetteerError {
    #[error("no airport source produced valid records and the bundled dataset is empty")]
    LoadFailure,
    #[error("bundled airport dataset is not valid JSON: {0}")]
    BundledDataset(#[from] serde_json::Error),
}

/// Where a loaded airport set came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AirportSource {
    File(PathBuf),
    Bundled,
}

/// Candidate locations for the airport dataset
#[derive(Debug, Clone)]
pub struct GazetteerSources {
    /// Explicitly configured dataset path, tried first
    pub configured: Option<PathBuf>,
    /// Project root holding `data/` and `public/airports/`
    pub root: PathBuf,
}

impl GazetteerSources {
    /// Sources derived from `AIRPORTS_JSON_PATH` and the current directory
    pub fn from_env() -> Self {
        let configured = std::env::var_os(AIRPORTS_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { configured, root }
    }

    /// Candidate paths in lookup order
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut out = Vec::with_capacity(3);
        if let Some(configured) = &self.configured {
            out.push(configured.clone());
        }
        out.push(self.root.join("data").join("airports.json"));
        out.push(self.root.join("public").join("airports").join("airports.json"));
        out
    }
}

/// An immutable airport set with nearest-neighbour lookup
#[derive(Debug, Clone)]
pub struct Gazetteer {
    airports: Vec<Airport>,
    source: AirportSource,
}

impl Gazetteer {
    /// Load from the first usable candidate source, falling back to the bundled dataset
    pub fn load(sources: &GazetteerSources) -> Result<Self, GazetteerError> {
        for path in sources.candidates() {
            if let Some(airports) = try_load_file(&path) {
                info!("Loaded {} airports from {}", airports.len(), path.display());
                metrics::counter!("gazetteer.loads_total", "source" => "file").increment(1);
                return Ok(Self {
                    airports,
                    source: AirportSource::File(path),
                });
            }
        }

        let gazetteer = Self::bundled()?;
        info!(
            "No external airport dataset found; using {} bundled airports",
            gazetteer.airports.len()
        );
        metrics::counter!("gazetteer.loads_total", "source" => "bundled").increment(1);
        Ok(gazetteer)
    }

    /// The dataset compiled into the binary
    pub fn bundled() -> Result<Self, GazetteerError> {
        let airports = parse_airports_json(BUNDLED_AIRPORTS_JSON)?;
        if airports.is_empty() {
            return Err(GazetteerError::LoadFailure);
        }
        Ok(Self {
            airports,
            source: AirportSource::Bundled,
        })
    }

    pub fn airports(&self) -> &[Airport] {
        &self.airports
    }

    pub fn source(&self) -> &AirportSource {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    /// Look up an airport by ICAO or IATA code (case-insensitive)
    pub fn find_by_code(&self, code: &str) -> Option<&Airport> {
        let code = code.trim();
        self.airports.iter().find(|a| {
            a.icao.eq_ignore_ascii_case(code)
                || a.iata.as_deref().is_some_and(|i| i.eq_ignore_ascii_case(code))
        })
    }
}

fn try_load_file(path: &Path) -> Option<Vec<Airport>> {
    if !path.exists() {
        debug!("Airport source {} does not exist", path.display());
        return None;
    }

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to read airport source {}: {}", path.display(), e);
            return None;
        }
    };

    match parse_airports_json(&text) {
        Ok(airports) if !airports.is_empty() => Some(airports),
        Ok(_) => {
            warn!("Airport source {} has no valid records, skipping", path.display());
            None
        }
        Err(e) => {
            warn!("Airport source {} is not valid JSON: {}", path.display(), e);
            None
        }
    }
}

/// Process-wide airport set, loaded on first call from [`GazetteerSources::from_env`].
///
/// Later calls return the same set without touching the filesystem. Two threads
/// racing on the first call may both load; only one result is kept.
pub fn load_airports() -> Result<&'static Gazetteer, GazetteerError> {
    load_airports_from(&GazetteerSources::from_env())
}

/// Like [`load_airports`] with explicit sources. Sources are only consulted
/// by whichever call populates the cache first.
pub fn load_airports_from(
    sources: &GazetteerSources,
) -> Result<&'static Gazetteer, GazetteerError> {
    if let Some(cached) = AIRPORTS_CACHE.get() {
        return Ok(cached);
    }
    let loaded = Gazetteer::load(sources)?;
    Ok(AIRPORTS_CACHE.get_or_init(|| loaded))
}

/// Linear nearest-neighbour scan by great-circle distance.
///
/// Returns `None` for an empty candidate list, a non-finite query point or
/// radius, or when the best distance exceeds `max_km`. Equal distances resolve to the
/// earliest candidate.
pub fn nearest_airport(
    lat: f64,
    lng: f64,
    airports: &[Airport],
    max_km: Option<f64>,
) -> Option<&Airport> {
    nearest_airport_with_distance(lat, lng, airports, max_km).map(|(airport, _)| airport)
}

/// Same as [`nearest_airport`] but also returns the distance in kilometres
pub fn nearest_airport_with_distance(
    lat: f64,
    lng: f64,
    airports: &[Airport],
    max_km: Option<f64>,
) -> Option<(&Airport, f64)> {
    if !lat.is_finite() || !lng.is_finite() {
        return None;
    }
    if max_km.is_some_and(|km| !km.is_finite()) {
        return None;
    }

    let mut best: Option<(&Airport, f64)> = None;
    for airport in airports {
        let d = haversine_distance_km(lat, lng, airport.lat, airport.lng);
        match best {
            Some((_, best_km)) if d >= best_km => {}
            _ => best = Some((airport, d)),
        }
    }

    let (airport, km) = best?;
    if let Some(max_km) = max_km
        && km > max_km
    {
        debug!(
            "Nearest airport {} is {:.1} km away, beyond the {:.1} km radius",
            airport.icao, km, max_km
        );
        return None;
    }
    Some((airport, km))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn airport(icao: &str, iata: Option<&str>, lat: f64, lng: f64) -> Airport {
        Airport {
            icao: icao.to_string(),
            iata: iata.map(str::to_string),
            name: format!("{icao} field"),
            lat,
            lng,
        }
    }

    fn bay_area() -> Vec<Airport> {
        vec![
            airport("KSFO", Some("SFO"), 37.6213, -122.379),
            airport("KOAK", Some("OAK"), 37.7213, -122.221),
            airport("KPAO", Some("PAO"), 37.4611, -122.115),
            airport("KNUQ", None, 37.4161, -122.049),
        ]
    }

    #[test]
    fn test_nearest_picks_minimum_distance() {
        let airports = bay_area();
        let nearest = nearest_airport(37.46, -122.12, &airports, None).unwrap();
        assert_eq!(nearest.icao, "KPAO");
    }

    #[test]
    fn test_nearest_respects_radius() {
        // Sacramento is far from every Bay Area field
        let airports = bay_area();
        assert!(nearest_airport(38.6953, -121.5908, &airports, Some(10.0)).is_none());
        assert!(nearest_airport(38.6953, -121.5908, &airports, None).is_some());
    }

    #[test]
    fn test_nearest_within_radius_matches() {
        let airports = bay_area();
        let (airport, km) =
            nearest_airport_with_distance(37.62, -122.38, &airports, Some(10.0)).unwrap();
        assert_eq!(airport.icao, "KSFO");
        assert!(km < 1.0);
    }

    #[test]
    fn test_ties_resolve_to_first_candidate() {
        let airports = vec![
            airport("AAAA", None, 1.0, 0.0),
            airport("BBBB", None, -1.0, 0.0),
        ];
        let nearest = nearest_airport(0.0, 0.0, &airports, None).unwrap();
        assert_eq!(nearest.icao, "AAAA");
    }

    #[test]
    fn test_empty_and_non_finite_queries() {
        assert!(nearest_airport(37.0, -122.0, &[], None).is_none());
        let airports = bay_area();
        assert!(nearest_airport(f64::NAN, -122.0, &airports, None).is_none());
        assert!(nearest_airport(37.0, f64::INFINITY, &airports, Some(10.0)).is_none());
    }

    #[test]
    fn test_non_finite_radius_matches_nothing() {
        let airports = bay_area();
        assert!(nearest_airport(37.4611, -122.115, &airports, Some(f64::NAN)).is_none());
        assert!(nearest_airport(37.4611, -122.115, &airports, Some(f64::INFINITY)).is_none());
        assert!(nearest_airport(37.4611, -122.115, &airports, Some(1.0)).is_some());
    }

    #[test]
    fn test_bundled_dataset_is_valid() {
        let gazetteer = Gazetteer::bundled().unwrap();
        assert!(!gazetteer.is_empty());
        assert_eq!(gazetteer.source(), &AirportSource::Bundled);
        assert_eq!(gazetteer.find_by_code("sfo").unwrap().icao, "KSFO");
        assert_eq!(gazetteer.find_by_code("KPAO").unwrap().logbook_code(), "PAO");
    }

    #[test]
    fn test_candidates_order() {
        let sources = GazetteerSources {
            configured: Some(PathBuf::from("/etc/airports.json")),
            root: PathBuf::from("/srv/app"),
        };
        assert_eq!(
            sources.candidates(),
            vec![
                PathBuf::from("/etc/airports.json"),
                PathBuf::from("/srv/app/data/airports.json"),
                PathBuf::from("/srv/app/public/airports/airports.json"),
            ]
        );
    }

    #[test]
    fn test_load_skips_invalid_sources() {
        let dir = tempfile::tempdir().unwrap();
        let configured = dir.path().join("configured.json");
        std::fs::write(&configured, r#"[{"icao":"","lat":1,"lng":2}]"#).unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/airports.json"), "{ broken").unwrap();
        std::fs::create_dir_all(dir.path().join("public/airports")).unwrap();
        let public = dir.path().join("public/airports/airports.json");
        std::fs::write(&public, r#"[{"icao":"KLVK","iata":"LVK","lat":37.6934,"lng":-121.822}]"#)
            .unwrap();

        let sources = GazetteerSources {
            configured: Some(configured),
            root: dir.path().to_path_buf(),
        };
        let gazetteer = Gazetteer::load(&sources).unwrap();
        assert_eq!(gazetteer.source(), &AirportSource::File(public));
        assert_eq!(gazetteer.len(), 1);
        assert_eq!(gazetteer.airports()[0].icao, "KLVK");
    }

    #[test]
    fn test_load_falls_back_to_bundled() {
        let dir = tempfile::tempdir().unwrap();
        let sources = GazetteerSources {
            configured: Some(dir.path().join("missing.json")),
            root: dir.path().to_path_buf(),
        };
        let gazetteer = Gazetteer::load(&sources).unwrap();
        assert_eq!(gazetteer.source(), &AirportSource::Bundled);
        assert_eq!(gazetteer.len(), Gazetteer::bundled().unwrap().len());
    }
}
