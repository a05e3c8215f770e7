use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("A global tracing subscriber is already installed")]
    AlreadyInstalled,

    #[error("Failed to install log bridge: {0}")]
    LogBridge(String),
}

/// Failure reported by a transport for a single upload.
///
/// Carried into the record as data; never surfaced as a fault to callers of
/// the tracker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("{0}")]
    Failed(String),

    #[error("Upload cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, TrackerError>;
