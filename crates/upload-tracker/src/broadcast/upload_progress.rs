//! Upload progress broadcaster for real-time record updates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::record::{UploadId, UploadRecord, UploadStatus};

/// What happened to a record.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Queued,
    Started,
    Progress,
    Completed,
    Failed,
    Removed,
}

impl std::fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadPhase::Queued => write!(f, "Queued"),
            UploadPhase::Started => write!(f, "Uploading"),
            UploadPhase::Progress => write!(f, "Progress"),
            UploadPhase::Completed => write!(f, "Completed"),
            UploadPhase::Failed => write!(f, "Failed"),
            UploadPhase::Removed => write!(f, "Removed"),
        }
    }
}

/// Progress event for one record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgressEvent {
    pub upload_id: UploadId,
    pub filename: String,
    pub phase: UploadPhase,
    /// Record status after the change.
    pub status: UploadStatus,
    pub progress: u8,
    /// Human-readable message describing the change.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl UploadProgressEvent {
    /// Creates an event describing the record's current state.
    pub fn from_record(phase: UploadPhase, record: &UploadRecord) -> Self {
        let message = match phase {
            UploadPhase::Queued => "Queued for upload".to_string(),
            UploadPhase::Started => "Upload started".to_string(),
            UploadPhase::Progress => format!("Uploaded {}%", record.progress),
            UploadPhase::Completed => "Upload completed successfully".to_string(),
            UploadPhase::Failed => "Upload failed".to_string(),
            UploadPhase::Removed => "Removed from the list".to_string(),
        };

        Self {
            upload_id: record.id,
            filename: record.name.clone(),
            phase,
            status: record.status,
            progress: record.progress,
            message,
            error: record.error.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Broadcasts upload progress events for streaming.
#[derive(Clone)]
pub struct UploadProgressBroadcaster {
    sender: Arc<broadcast::Sender<UploadProgressEvent>>,
}

impl UploadProgressBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends a progress event to all subscribers.
    pub fn send(&self, event: UploadProgressEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    /// Creates a new subscriber for progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadProgressEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for UploadProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
