//! Timer-driven transport that pretends to upload.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::SimulationConfig;
use crate::error::TransportError;
use crate::intake::FileHandle;
use crate::transport::{ProgressSink, Transport};

/// How the simulated transport decides the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedOutcome {
    /// Fail with the configured probability.
    Random,
    AlwaysSucceed,
    AlwaysFail,
}

/// Reports a fixed increment every tick until the total duration elapses,
/// then succeeds or fails.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    config: SimulationConfig,
    outcome: SimulatedOutcome,
}

impl SimulatedTransport {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            outcome: SimulatedOutcome::Random,
        }
    }

    /// Pins the outcome instead of rolling for it.
    pub fn with_outcome(mut self, outcome: SimulatedOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn should_fail(&self) -> bool {
        match self.outcome {
            SimulatedOutcome::AlwaysSucceed => false,
            SimulatedOutcome::AlwaysFail => true,
            SimulatedOutcome::Random => rand::random::<f64>() < self.config.failure_rate,
        }
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn upload(
        &self,
        file: &FileHandle,
        progress: &dyn ProgressSink,
    ) -> Result<(), TransportError> {
        let tick = Duration::from_millis(self.config.tick_interval_ms.max(1));
        let total = Duration::from_millis(self.config.total_duration_ms);
        let mut elapsed = Duration::ZERO;

        while elapsed + tick <= total {
            tokio::time::sleep(tick).await;
            elapsed += tick;
            progress.advance(self.config.progress_increment);
        }

        if elapsed < total {
            tokio::time::sleep(total - elapsed).await;
        }

        if self.should_fail() {
            debug!("Simulated failure for '{}'", file.name);
            return Err(TransportError::Failed(self.config.failure_message.clone()));
        }

        Ok(())
    }
}
