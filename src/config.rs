//! Runtime configuration at ~/.geoflags/config.json.
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! Command-line flags override whatever is loaded here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::location::providers::{DEFAULT_IPINFO_URL, DEFAULT_IP_API_URL, DEFAULT_REVERSE_GEOCODE_URL};
use crate::location::PositionOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the server binds to.
    pub host: String,
    pub port: u16,
    /// Origin the client uses to reach the backend.
    pub backend_url: String,
    pub reverse_geocode_url: String,
    pub ipinfo_url: String,
    pub ip_api_url: String,
    /// Device position timeout, seconds.
    pub device_timeout_secs: u64,
    /// Oldest acceptable cached device fix, seconds.
    pub device_max_age_secs: u64,
    /// Service name reported by `/health`.
    pub service_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            backend_url: "http://localhost:3000".into(),
            reverse_geocode_url: DEFAULT_REVERSE_GEOCODE_URL.into(),
            ipinfo_url: DEFAULT_IPINFO_URL.into(),
            ip_api_url: DEFAULT_IP_API_URL.into(),
            device_timeout_secs: 10,
            device_max_age_secs: 300,
            service_name: "geoflags".into(),
        }
    }
}

impl Config {
    /// Load from the default location; missing file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path())
    }

    /// Load from a specific path; missing file → defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = match fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read { path: path.to_path_buf(), source });
            }
        };
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".geoflags")
            .join("config.json")
    }

    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            timeout: Duration::from_secs(self.device_timeout_secs),
            maximum_age: Duration::from_secs(self.device_max_age_secs),
            ..PositionOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.port, 3000);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"port": 8080, "backend_url": "http://10.0.0.2:8080"}"#).unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.backend_url, "http://10.0.0.2:8080");
        assert_eq!(cfg.ipinfo_url, DEFAULT_IPINFO_URL);
        assert_eq!(cfg.device_timeout_secs, 10);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ port: ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_position_options_from_config() {
        let cfg = Config { device_timeout_secs: 3, device_max_age_secs: 60, ..Config::default() };
        let opts = cfg.position_options();
        assert_eq!(opts.timeout, Duration::from_secs(3));
        assert_eq!(opts.maximum_age, Duration::from_secs(60));
        assert!(opts.high_accuracy);
    }
}
