use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("poll interval must be greater than zero")]
    InvalidPollInterval,
    #[error("buffer capacity must be greater than zero")]
    InvalidCapacity,
    #[error("no data to export")]
    NoData,
    #[error("template altitude {0} ft is above the 34000 ft limit")]
    TemplateAltitude(u32),
    #[error("program already has the maximum of {0} steps")]
    TooManySteps(u32),
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}
