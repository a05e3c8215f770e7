use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, Instrument};

use crate::intake::FileHandle;
use crate::record::{UploadEvent, UploadId};
use crate::transport::{ProgressSink, Transport};

/// An event tagged with the record it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerMessage {
    pub id: UploadId,
    pub event: UploadEvent,
}

/// Drives one record from `Pending` to a terminal status.
///
/// The worker never touches the store; it only sends events, in order, over
/// the channel it was given.
pub struct UploadWorker {
    id: UploadId,
    file: FileHandle,
    transport: Arc<dyn Transport>,
    events: UnboundedSender<WorkerMessage>,
}

impl UploadWorker {
    pub fn new(
        id: UploadId,
        file: FileHandle,
        transport: Arc<dyn Transport>,
        events: UnboundedSender<WorkerMessage>,
    ) -> Self {
        Self {
            id,
            file,
            transport,
            events,
        }
    }

    /// Runs the worker on the current Tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        let span = info_span!("upload.worker", upload_id = %self.id, file = %self.file.name);
        tokio::spawn(self.run().instrument(span))
    }

    /// Emits `Started`, forwards progress, then exactly one terminal event.
    pub async fn run(self) {
        self.emit(UploadEvent::Started);

        let sink = ChannelSink {
            id: self.id,
            events: self.events.clone(),
        };
        let terminal = match self.transport.upload(&self.file, &sink).await {
            Ok(()) => UploadEvent::Completed,
            Err(e) => UploadEvent::Failed(e.to_string()),
        };

        debug!("Worker finished with {:?}", terminal);
        self.emit(terminal);
    }

    fn emit(&self, event: UploadEvent) {
        send_event(&self.events, self.id, event);
    }
}

fn send_event(events: &UnboundedSender<WorkerMessage>, id: UploadId, event: UploadEvent) {
    // Tracker gone means nobody cares about this upload any more
    if events.send(WorkerMessage { id, event }).is_err() {
        debug!("Event channel closed for upload {}", id);
    }
}

struct ChannelSink {
    id: UploadId,
    events: UnboundedSender<WorkerMessage>,
}

impl ProgressSink for ChannelSink {
    fn advance(&self, delta: u8) {
        if delta > 0 {
            send_event(&self.events, self.id, UploadEvent::ProgressTick(delta));
        }
    }
}
