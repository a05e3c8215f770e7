//! Transport whose behavior is scripted per file name.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use upload_tracker::{FileHandle, ProgressSink, Transport, TransportError};

/// One step of a scripted upload.
#[derive(Debug, Clone)]
pub enum Step {
    /// Report progress.
    Tick(u8),
    /// Sleep for the given number of milliseconds.
    Pause(u64),
    Succeed,
    Fail(&'static str),
}

/// Plays a fixed script for each upload. Files without their own script run
/// the default one.
pub struct ScriptedTransport {
    scripts: HashMap<String, Vec<Step>>,
    default: Vec<Step>,
    attempts: Mutex<HashMap<String, usize>>,
}

impl ScriptedTransport {
    /// Ten ticks of 10% at 300ms, then success.
    pub fn new() -> Self {
        let mut default = Vec::new();
        for _ in 0..10 {
            default.push(Step::Pause(300));
            default.push(Step::Tick(10));
        }
        default.push(Step::Succeed);

        Self {
            scripts: HashMap::new(),
            default,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    pub fn script(mut self, name: &str, steps: Vec<Step>) -> Self {
        self.scripts.insert(name.to_string(), steps);
        self
    }

    pub fn default_script(mut self, steps: Vec<Step>) -> Self {
        self.default = steps;
        self
    }

    /// Number of uploads started for the given file name.
    pub fn attempts(&self, name: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn upload(
        &self,
        file: &FileHandle,
        progress: &dyn ProgressSink,
    ) -> Result<(), TransportError> {
        *self
            .attempts
            .lock()
            .unwrap()
            .entry(file.name.clone())
            .or_default() += 1;

        let steps = self.scripts.get(&file.name).unwrap_or(&self.default).clone();
        for step in steps {
            match step {
                Step::Tick(delta) => progress.advance(delta),
                Step::Pause(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
                Step::Succeed => return Ok(()),
                Step::Fail(message) => return Err(TransportError::Failed(message.to_string())),
            }
        }
        Ok(())
    }
}
