use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::gazetteer::{DEFAULT_MATCH_RADIUS_KM, GazetteerSources};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "JPI_LOGBOOK_CONFIG";

/// Optional `jpi-logbook.toml` settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogbookConfig {
    /// Airport dataset tried before the project-root candidates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airports_json_path: Option<PathBuf>,
    /// Project root holding `data/airports.json`; defaults to the working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(default = "default_match_radius_km")]
    pub match_radius_km: f64,
}

fn default_match_radius_km() -> f64 {
    DEFAULT_MATCH_RADIUS_KM
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            airports_json_path: None,
            root: None,
            match_radius_km: DEFAULT_MATCH_RADIUS_KM,
        }
    }
}

impl LogbookConfig {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: LogbookConfig =
            toml::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, else the resolved default path when it exists,
    /// else built-in defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.match_radius_km.is_finite() || self.match_radius_km <= 0.0 {
            bail!(
                "match_radius_km must be a positive number, got {}",
                self.match_radius_km
            );
        }
        Ok(())
    }

    /// Airport dataset candidates. `AIRPORTS_JSON_PATH` overrides `airports_json_path`.
    pub fn gazetteer_sources(&self) -> GazetteerSources {
        let mut sources = GazetteerSources::from_env();
        if sources.configured.is_none() {
            sources.configured = self.airports_json_path.clone();
        }
        if let Some(root) = &self.root {
            sources.root = root.clone();
        }
        sources
    }
}

/// Resolve the config file path.
///
/// Priority:
/// 1. `JPI_LOGBOOK_CONFIG` env var
/// 2. `./jpi-logbook.toml`
pub fn config_path() -> PathBuf {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from("./jpi-logbook.toml"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::AIRPORTS_PATH_ENV;
    use serial_test::serial;

    #[test]
    fn test_load_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jpi-logbook.toml");
        std::fs::write(&path, "root = \"/srv/logbook\"\n").unwrap();

        let config = LogbookConfig::load(&path).unwrap();
        assert_eq!(config.root, Some(PathBuf::from("/srv/logbook")));
        assert_eq!(config.airports_json_path, None);
        assert_eq!(config.match_radius_km, 10.0);
    }

    #[test]
    fn test_load_rejects_bad_radius() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jpi-logbook.toml");
        std::fs::write(&path, "match_radius_km = -3.0\n").unwrap();
        let err = LogbookConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("match_radius_km"));

        std::fs::write(&path, "match_radius_km = \"far\"\n").unwrap();
        assert!(LogbookConfig::load(&path).is_err());
    }

    #[test]
    fn test_resolve_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LogbookConfig::resolve(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = LogbookConfig {
            airports_json_path: Some(PathBuf::from("/data/airports.json")),
            root: None,
            match_radius_km: 5.5,
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: LogbookConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    #[serial]
    fn test_gazetteer_sources_from_config() {
        // SAFETY: serialized with every other test touching the process environment
        unsafe { std::env::remove_var(AIRPORTS_PATH_ENV) };

        let config = LogbookConfig {
            airports_json_path: Some(PathBuf::from("/data/airports.json")),
            root: Some(PathBuf::from("/srv/logbook")),
            match_radius_km: 10.0,
        };
        let candidates = config.gazetteer_sources().candidates();
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/data/airports.json"),
                PathBuf::from("/srv/logbook/data/airports.json"),
                PathBuf::from("/srv/logbook/public/airports/airports.json"),
            ]
        );
    }

    #[test]
    #[serial]
    fn test_env_path_overrides_config() {
        // SAFETY: serialized with every other test touching the process environment
        unsafe { std::env::set_var(AIRPORTS_PATH_ENV, "/env/airports.json") };
        let config = LogbookConfig {
            airports_json_path: Some(PathBuf::from("/data/airports.json")),
            ..Default::default()
        };
        let sources = config.gazetteer_sources();
        unsafe { std::env::remove_var(AIRPORTS_PATH_ENV) };

        assert_eq!(sources.configured, Some(PathBuf::from("/env/airports.json")));
    }
}
