use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub intake: IntakePolicy,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_event_capacity() -> usize {
    100
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            intake: IntakePolicy::default(),
            simulation: SimulationConfig::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Size and type limits applied before a file becomes a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakePolicy {
    /// Lowercase extensions without the dot. Empty accepts any type.
    #[serde(default = "default_extensions")]
    pub accepted_extensions: BTreeSet<String>,
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,
}

fn default_extensions() -> BTreeSet<String> {
    ["pdf", "doc", "docx"].iter().map(|s| s.to_string()).collect()
}

fn default_max_size_bytes() -> u64 {
    10 * MIB
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            accepted_extensions: default_extensions(),
            max_size_bytes: default_max_size_bytes(),
        }
    }
}

impl IntakePolicy {
    pub fn new<I, S>(extensions: I, max_size_bytes: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            accepted_extensions: extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .collect(),
            max_size_bytes,
        }
    }

    /// Lowercases extensions and strips leading dots.
    pub fn normalized(mut self) -> Self {
        self.accepted_extensions = self
            .accepted_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .collect();
        self
    }

    pub fn accepts_extension(&self, extension: Option<&str>) -> bool {
        if self.accepted_extensions.is_empty() {
            return true;
        }
        extension.is_some_and(|ext| self.accepted_extensions.contains(&normalize_extension(ext)))
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Timing and outcome of the simulated transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_progress_increment")]
    pub progress_increment: u8,
    #[serde(default = "default_total_duration_ms")]
    pub total_duration_ms: u64,
    /// Probability in `[0, 1]` that an upload fails.
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,
    #[serde(default = "default_failure_message")]
    pub failure_message: String,
}

fn default_tick_interval_ms() -> u64 {
    300
}

fn default_progress_increment() -> u8 {
    10
}

fn default_total_duration_ms() -> u64 {
    3000
}

fn default_failure_rate() -> f64 {
    0.2
}

fn default_failure_message() -> String {
    "Upload failed. Please try again.".to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            progress_increment: default_progress_increment(),
            total_duration_ms: default_total_duration_ms(),
            failure_rate: default_failure_rate(),
            failure_message: default_failure_message(),
        }
    }
}
