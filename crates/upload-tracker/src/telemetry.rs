//! Logging setup for binaries embedding the tracker.
//!
//! Installs a `tracing` subscriber (pretty or JSON) filtered by `RUST_LOG`
//! and bridges records emitted through the `log` facade into it.

use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::TelemetryError;

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Pretty in debug builds, JSON in release builds.
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is absent, e.g. `info` or `upload_tracker=debug`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::infer(),
        }
    }
}

/// Installs the global subscriber and the `log` bridge. Output goes to stderr.
///
/// # Errors
/// Returns `AlreadyInstalled` if a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let (json, pretty) = match config.format {
        LogFormat::Json => (
            Some(fmt::layer().json().with_target(true).with_writer(std::io::stderr)),
            None,
        ),
        LogFormat::Pretty => (
            None,
            Some(fmt::layer().with_target(true).with_writer(std::io::stderr)),
        ),
    };

    let subscriber = tracing_subscriber::registry()
        .with(build_env_filter(&config.level))
        .with(json)
        .with(pretty);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| TelemetryError::AlreadyInstalled)?;

    LogTracer::init().map_err(|e| TelemetryError::LogBridge(e.to_string()))?;

    Ok(())
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
