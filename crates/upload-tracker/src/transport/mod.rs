//! Transport capability the workers drive.
//!
//! A transport moves one file and reports progress through a [`ProgressSink`].
//! Its return value decides the terminal event, so a worker emits exactly one
//! terminal event whatever the transport does.

pub mod simulated;

pub use simulated::{SimulatedOutcome, SimulatedTransport};

use async_trait::async_trait;

use crate::error::TransportError;
use crate::intake::FileHandle;

/// Receives progress reported by a transport.
pub trait ProgressSink: Send + Sync {
    /// Progress advanced by `delta` percentage points.
    fn advance(&self, delta: u8);
}

/// No-op sink for unit tests.
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn advance(&self, _delta: u8) {}
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Uploads one file. `Ok` means the upload completed.
    async fn upload(
        &self,
        file: &FileHandle,
        progress: &dyn ProgressSink,
    ) -> Result<(), TransportError>;
}
