// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::Deserialize;

use crate::service::{DashboardError, DEFAULT_CAPACITY, DEFAULT_POLL_INTERVAL};

/// Env var pointing at a JSON config file.
pub const CONFIG_ENV_VAR: &str = "ROBD2_DASHBOARD_CONFIG";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub poll_interval_ms: u64,
    pub buffer_capacity: usize,
    pub default_port: String,
    pub export_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            buffer_capacity: DEFAULT_CAPACITY,
            default_port: "COM3".to_owned(),
            export_dir: PathBuf::from("."),
        }
    }
}

impl DashboardConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.poll_interval_ms == 0 {
            return Err(DashboardError::InvalidPollInterval);
        }
        if self.buffer_capacity == 0 {
            return Err(DashboardError::InvalidCapacity);
        }
        Ok(())
    }

    pub fn from_json(text: &str, path: &Path) -> Result<Self, DashboardError> {
        let config: Self =
            serde_json::from_str(text).map_err(|source| DashboardError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        let text = fs::read_to_string(path).map_err(|source| DashboardError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Reads the file named by `ROBD2_DASHBOARD_CONFIG`, falling back to
    /// defaults when unset or broken.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
            return Self::default();
        };
        let path = PathBuf::from(path);
        match Self::load(&path) {
            Ok(config) => {
                info!("loaded config from {}", path.display());
                config
            }
            Err(err) => {
                warn!("{err}; using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config =
            DashboardConfig::from_json(r#"{"poll_interval_ms": 500}"#, Path::new("x.json")).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.buffer_capacity, 2000);
        assert_eq!(config.default_port, "COM3");
    }

    #[test]
    fn default_interval_matches_polling_default() {
        assert_eq!(DashboardConfig::default().poll_interval(), DEFAULT_POLL_INTERVAL);
        assert_eq!(DashboardConfig::default().poll_interval_ms, 2000);
    }

    #[test]
    fn zero_values_are_rejected() {
        let path = Path::new("x.json");
        assert!(matches!(
            DashboardConfig::from_json(r#"{"poll_interval_ms": 0}"#, path),
            Err(DashboardError::InvalidPollInterval)
        ));
        assert!(matches!(
            DashboardConfig::from_json(r#"{"buffer_capacity": 0}"#, path),
            Err(DashboardError::InvalidCapacity)
        ));
    }

    #[test]
    fn bad_json_and_missing_file() {
        assert!(matches!(
            DashboardConfig::from_json("{not json", Path::new("x.json")),
            Err(DashboardError::ConfigParse { .. })
        ));
        assert!(matches!(
            DashboardConfig::load(Path::new("/definitely/not/here.json")),
            Err(DashboardError::ConfigRead { .. })
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = std::env::temp_dir().join(format!("robd2-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dashboard.json");
        fs::write(&path, r#"{"default_port": "/dev/ttyUSB0", "export_dir": "/tmp"}"#).unwrap();
        let config = DashboardConfig::load(&path).unwrap();
        assert_eq!(config.default_port, "/dev/ttyUSB0");
        assert_eq!(config.export_dir, PathBuf::from("/tmp"));
        fs::remove_dir_all(&dir).ok();
    }
}
