use std::path::Path;

use crate::config::schema::TrackerConfig;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/tracker-config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TrackerConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<TrackerConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let mut config: TrackerConfig = serde_json::from_value(json_value)?;
    config.intake = config.intake.normalized();

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Semantic checks the schema cannot express.
pub fn validate_config(config: &TrackerConfig) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.intake.max_size_bytes == 0 {
        return Err(ConfigError::Validation {
            message: "intake.max_size_bytes must be greater than zero".to_string(),
        });
    }

    if config.intake.accepted_extensions.iter().any(|e| e.is_empty()) {
        return Err(ConfigError::Validation {
            message: "intake.accepted_extensions must not contain empty entries".to_string(),
        });
    }

    let sim = &config.simulation;
    if sim.progress_increment == 0 || sim.progress_increment > 100 {
        return Err(ConfigError::Validation {
            message: format!(
                "simulation.progress_increment must be within 1..=100, got {}",
                sim.progress_increment
            ),
        });
    }

    if sim.tick_interval_ms == 0 {
        return Err(ConfigError::Validation {
            message: "simulation.tick_interval_ms must be greater than zero".to_string(),
        });
    }

    if sim.total_duration_ms < sim.tick_interval_ms {
        return Err(ConfigError::Validation {
            message: format!(
                "simulation.total_duration_ms ({}) must be at least tick_interval_ms ({})",
                sim.total_duration_ms, sim.tick_interval_ms
            ),
        });
    }

    if !(0.0..=1.0).contains(&sim.failure_rate) {
        return Err(ConfigError::Validation {
            message: format!(
                "simulation.failure_rate must be within [0, 1], got {}",
                sim.failure_rate
            ),
        });
    }

    if config.event_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "event_capacity must be greater than zero".to_string(),
        });
    }

    Ok(())
}
