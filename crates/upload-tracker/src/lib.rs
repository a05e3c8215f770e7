pub mod broadcast;
pub mod config;
pub mod error;
pub mod format;
pub mod intake;
pub mod record;
pub mod store;
pub mod telemetry;
pub mod tracker;
pub mod transport;
pub mod worker;

pub use broadcast::{UploadPhase, UploadProgressBroadcaster, UploadProgressEvent};
pub use config::{load_config, IntakePolicy, SimulationConfig, TrackerConfig};
pub use error::{ConfigError, Result, TelemetryError, TrackerError, TransportError};
pub use format::format_file_size;
pub use intake::{FileHandle, FileIntake, FileOrigin, IntakeBatch, Rejection, RejectionReason};
pub use record::{UploadEvent, UploadId, UploadRecord, UploadStatus};
pub use store::{ApplyOutcome, UploadStore};
pub use telemetry::{init_logging, LogFormat, LoggingConfig};
pub use tracker::{BatchOutcome, Snapshot, SnapshotSummary, UploadTracker};
pub use transport::{ProgressSink, SimulatedOutcome, SimulatedTransport, Transport};
pub use worker::UploadWorker;
