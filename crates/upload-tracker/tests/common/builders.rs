//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use std::path::PathBuf;

use upload_tracker::config::schema::MIB;
use upload_tracker::{FileHandle, FileOrigin, IntakePolicy, SimulationConfig, TrackerConfig};

/// Builder for creating `FileHandle` instances.
pub struct FileHandleBuilder {
    name: String,
    size_bytes: u64,
    mime_type: Option<String>,
    location: Option<PathBuf>,
    origin: FileOrigin,
}

impl FileHandleBuilder {
    /// Create a dropped 1 KiB file with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            size_bytes: 1024,
            mime_type: None,
            location: None,
            origin: FileOrigin::Drop,
        }
    }

    pub fn size_bytes(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    pub fn size_mib(mut self, mib: u64) -> Self {
        self.size_bytes = mib * MIB;
        self
    }

    pub fn mime_type(mut self, mime_type: &str) -> Self {
        self.mime_type = Some(mime_type.to_string());
        self
    }

    pub fn location(mut self, path: PathBuf) -> Self {
        self.location = Some(path);
        self
    }

    pub fn picked(mut self) -> Self {
        self.origin = FileOrigin::Picker;
        self
    }

    pub fn build(self) -> FileHandle {
        FileHandle {
            name: self.name,
            size_bytes: self.size_bytes,
            mime_type: self.mime_type,
            location: self.location,
            origin: self.origin,
        }
    }
}

/// Shorthand for a batch of small dropped files.
pub fn files(names: &[&str]) -> Vec<FileHandle> {
    names.iter().map(|n| FileHandleBuilder::new(n).build()).collect()
}

/// Builder for creating `TrackerConfig` instances.
pub struct ConfigBuilder {
    intake: IntakePolicy,
    simulation: SimulationConfig,
    event_capacity: usize,
}

impl ConfigBuilder {
    /// Create a builder with the default intake policy and a simulation that
    /// never fails.
    pub fn new() -> Self {
        Self {
            intake: IntakePolicy::default(),
            simulation: SimulationConfig {
                failure_rate: 0.0,
                ..SimulationConfig::default()
            },
            event_capacity: 100,
        }
    }

    pub fn extensions(mut self, extensions: &[&str]) -> Self {
        self.intake = IntakePolicy::new(extensions.iter().copied(), self.intake.max_size_bytes);
        self
    }

    pub fn max_size_bytes(mut self, max_size_bytes: u64) -> Self {
        self.intake.max_size_bytes = max_size_bytes;
        self
    }

    pub fn failure_rate(mut self, rate: f64) -> Self {
        self.simulation.failure_rate = rate;
        self
    }

    pub fn timing(mut self, tick_interval_ms: u64, increment: u8, total_duration_ms: u64) -> Self {
        self.simulation.tick_interval_ms = tick_interval_ms;
        self.simulation.progress_increment = increment;
        self.simulation.total_duration_ms = total_duration_ms;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn build(self) -> TrackerConfig {
        TrackerConfig {
            version: "1.0".to_string(),
            intake: self.intake,
            simulation: self.simulation,
            event_capacity: self.event_capacity,
        }
    }

    /// Serialize the built config as pretty JSON.
    pub fn build_json(self) -> String {
        serde_json::to_string_pretty(&self.build()).expect("Failed to serialize config")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
