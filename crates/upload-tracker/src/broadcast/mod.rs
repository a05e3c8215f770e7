//! Broadcasting of record changes to any number of presentation layers.

pub mod upload_progress;

pub use upload_progress::{UploadPhase, UploadProgressBroadcaster, UploadProgressEvent};
