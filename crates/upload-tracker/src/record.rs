//! Upload records and the per-record state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of one upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadId(Uuid);

impl UploadId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UploadId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Lifecycle status of an upload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Succeeded,
    Failed,
}

impl UploadStatus {
    /// Returns true for `Succeeded` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Succeeded | UploadStatus::Failed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "Pending",
            UploadStatus::Uploading => "Uploading",
            UploadStatus::Succeeded => "Succeeded",
            UploadStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Event emitted by a worker for the record it drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Started,
    /// Progress advanced by the given number of percentage points.
    ProgressTick(u8),
    Completed,
    Failed(String),
}

impl UploadEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadEvent::Completed | UploadEvent::Failed(_))
    }
}

/// Tracked state of one file's upload attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: UploadId,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub status: UploadStatus,
    /// Percentage in `0..=100`.
    pub progress: u8,
    /// Set only while `status` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The failed record this attempt was retried from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_of: Option<UploadId>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Result of feeding an event to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// The event is not valid in the record's current status; nothing changed.
    Invalid,
}

impl UploadRecord {
    /// Creates a `Pending` record with zero progress.
    pub fn pending(name: &str, size_bytes: u64, mime_type: &str) -> Self {
        Self {
            id: UploadId::new(),
            name: name.to_string(),
            size_bytes,
            mime_type: mime_type.to_string(),
            status: UploadStatus::Pending,
            progress: 0,
            error: None,
            retry_of: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies one event according to the transition table.
    ///
    /// Terminal records never change. Terminal events force progress to 100
    /// whatever the outcome.
    pub fn apply(&mut self, event: &UploadEvent) -> Transition {
        match (self.status, event) {
            (UploadStatus::Pending, UploadEvent::Started) => {
                self.status = UploadStatus::Uploading;
            }
            (UploadStatus::Uploading, UploadEvent::ProgressTick(delta)) => {
                self.progress = self.progress.saturating_add(*delta).min(100);
            }
            (UploadStatus::Uploading, UploadEvent::Completed) => {
                self.status = UploadStatus::Succeeded;
                self.progress = 100;
                self.error = None;
                self.finished_at = Some(Utc::now());
            }
            (UploadStatus::Uploading, UploadEvent::Failed(reason)) => {
                self.status = UploadStatus::Failed;
                self.progress = 100;
                self.error = Some(reason.clone());
                self.finished_at = Some(Utc::now());
            }
            _ => return Transition::Invalid,
        }
        Transition::Applied
    }
}
