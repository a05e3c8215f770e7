//! Orchestrator that owns the record store and the upload workers.
//!
//! All store mutation goes through one place: worker events are queued on a
//! channel and applied one at a time by a single event loop, while user
//! commands (remove, retry, clear) take the same store lock. Presentation
//! layers read [`Snapshot`]s or subscribe to progress events.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::broadcast::{UploadPhase, UploadProgressBroadcaster, UploadProgressEvent};
use crate::config::{IntakePolicy, TrackerConfig};
use crate::intake::{FileHandle, FileIntake, IntakeItem, Rejection};
use crate::record::{UploadEvent, UploadId, UploadRecord, UploadStatus};
use crate::store::{ApplyOutcome, UploadStore};
use crate::transport::{SimulatedTransport, Transport};
use crate::worker::{UploadWorker, WorkerMessage};

/// Result of starting a batch.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// Ids of the new records, in input order.
    pub accepted: Vec<UploadId>,
    /// Files refused by the intake policy, in input order.
    pub rejected: Vec<Rejection>,
}

/// Immutable point-in-time view of all records, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub records: Vec<UploadRecord>,
}

/// Per-status counts over a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    pub total: usize,
    pub pending: usize,
    pub uploading: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl Snapshot {
    pub fn get(&self, id: UploadId) -> Option<&UploadRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: UploadId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> SnapshotSummary {
        let mut summary = SnapshotSummary {
            total: self.records.len(),
            ..SnapshotSummary::default()
        };
        for record in &self.records {
            match record.status {
                UploadStatus::Pending => summary.pending += 1,
                UploadStatus::Uploading => summary.uploading += 1,
                UploadStatus::Succeeded => summary.succeeded += 1,
                UploadStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

/// State shared between the tracker handle and its event loop.
struct Shared {
    store: RwLock<UploadStore>,
    /// File handles of records still in the store, kept for retries.
    files: Mutex<HashMap<UploadId, FileHandle>>,
    /// Workers of records that have not reached a terminal status.
    workers: Mutex<HashMap<UploadId, AbortHandle>>,
    broadcaster: UploadProgressBroadcaster,
    in_flight: watch::Sender<usize>,
}

impl Shared {
    fn store_read(&self) -> RwLockReadGuard<'_, UploadStore> {
        match self.store.read() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Upload store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn store_write(&self) -> RwLockWriteGuard<'_, UploadStore> {
        match self.store.write() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Upload store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn files(&self) -> MutexGuard<'_, HashMap<UploadId, FileHandle>> {
        self.files.lock().unwrap_or_else(|poisoned| {
            log::warn!("Upload file map lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn workers(&self) -> MutexGuard<'_, HashMap<UploadId, AbortHandle>> {
        self.workers.lock().unwrap_or_else(|poisoned| {
            log::warn!("Upload worker map lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Applies one worker event. Called only from the event loop.
    fn apply(&self, message: WorkerMessage) {
        let WorkerMessage { id, event } = message;

        let phase = match event {
            UploadEvent::Started => UploadPhase::Started,
            UploadEvent::ProgressTick(_) => UploadPhase::Progress,
            UploadEvent::Completed => UploadPhase::Completed,
            UploadEvent::Failed(_) => UploadPhase::Failed,
        };

        let record = {
            let mut store = self.store_write();
            let ApplyOutcome::Applied(record) = store.apply_event(id, &event) else {
                return;
            };
            self.publish(&store, phase, &record);
            record
        };

        if record.is_finished() {
            self.workers().remove(&id);
            match record.status {
                UploadStatus::Failed => warn!(
                    upload_id = %id,
                    "Upload of '{}' failed: {}",
                    record.name,
                    record.error.as_deref().unwrap_or_default()
                ),
                _ => info!(upload_id = %id, "Upload of '{}' completed", record.name),
            }
        }
    }

    /// Publishes a change while the store lock is still held, so subscribers
    /// and the in-flight counter observe changes in store order.
    fn publish(&self, store: &UploadStore, phase: UploadPhase, record: &UploadRecord) {
        self.broadcaster
            .send(UploadProgressEvent::from_record(phase, record));
        self.in_flight.send_replace(store.in_flight());
    }

    /// Drops the file handles and aborts the workers of removed records.
    fn forget(&self, ids: &[UploadId]) {
        let mut files = self.files();
        let mut workers = self.workers();
        for id in ids {
            files.remove(id);
            if let Some(handle) = workers.remove(id) {
                handle.abort();
            }
        }
    }
}

/// Tracks concurrent uploads of user-supplied files.
///
/// Public operations never fail: rejected files and failed uploads are
/// reported as data.
pub struct UploadTracker {
    shared: Arc<Shared>,
    intake: FileIntake,
    transport: Arc<dyn Transport>,
    events: mpsc::UnboundedSender<WorkerMessage>,
    event_loop: JoinHandle<()>,
}

impl UploadTracker {
    /// Creates a tracker backed by the given transport.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn new(config: &TrackerConfig, transport: Arc<dyn Transport>) -> Self {
        let (events, receiver) = mpsc::unbounded_channel();
        let (in_flight, _) = watch::channel(0);

        let shared = Arc::new(Shared {
            store: RwLock::new(UploadStore::new()),
            files: Mutex::new(HashMap::new()),
            workers: Mutex::new(HashMap::new()),
            broadcaster: UploadProgressBroadcaster::new(config.event_capacity),
            in_flight,
        });

        let event_loop = tokio::spawn(run_event_loop(Arc::clone(&shared), receiver));

        Self {
            shared,
            intake: FileIntake::new(config.intake.clone()),
            transport,
            events,
            event_loop,
        }
    }

    /// Creates a tracker backed by the simulated transport from `config`.
    pub fn simulated(config: &TrackerConfig) -> Self {
        let transport = SimulatedTransport::new(config.simulation.clone());
        Self::new(config, Arc::new(transport))
    }

    pub fn policy(&self) -> &IntakePolicy {
        self.intake.policy()
    }

    /// Admits a batch of raw files and starts one worker per accepted file.
    pub fn start_batch<I>(&self, files: I) -> BatchOutcome
    where
        I: IntoIterator<Item = FileHandle>,
    {
        let batch = self.intake.accept(files);
        let accepted = self.admit(batch.accepted);

        if !accepted.is_empty() || !batch.rejected.is_empty() {
            info!(
                "Started batch: {} accepted, {} rejected",
                accepted.len(),
                batch.rejected.len()
            );
        }

        BatchOutcome {
            accepted,
            rejected: batch.rejected,
        }
    }

    /// Removes a record. Later events from its worker are discarded.
    ///
    /// Returns false if the record was not present.
    pub fn remove(&self, id: UploadId) -> bool {
        let record = {
            let mut store = self.shared.store_write();
            let Some(record) = store.remove(id) else {
                return false;
            };
            self.shared.publish(&store, UploadPhase::Removed, &record);
            record
        };

        debug!(upload_id = %id, "Removed '{}'", record.name);
        self.shared.forget(&[id]);
        true
    }

    /// Replaces a failed record with a new pending record for the same file.
    ///
    /// Returns the new id, or `None` if `id` is not a failed record.
    pub fn retry(&self, id: UploadId) -> Option<UploadId> {
        let removed = {
            let mut store = self.shared.store_write();
            if store.get(id)?.status != UploadStatus::Failed {
                return None;
            }
            let removed = store.remove(id)?;
            self.shared.publish(&store, UploadPhase::Removed, &removed);
            removed
        };

        let file = self.shared.files().remove(&id);

        let Some(file) = file else {
            warn!(upload_id = %id, "No file handle kept for failed upload; cannot retry");
            return None;
        };

        let item = self.intake.readmit(&file, id);
        let new_id = self.admit(vec![item]).into_iter().next();
        info!(upload_id = %id, "Retrying '{}'", removed.name);
        new_id
    }

    /// Removes every succeeded or failed record and returns their ids.
    pub fn clear_finished(&self) -> Vec<UploadId> {
        let ids: Vec<UploadId> = {
            let mut store = self.shared.store_write();
            let removed = store.clear_finished();
            for record in &removed {
                self.shared.publish(&store, UploadPhase::Removed, record);
            }
            removed.iter().map(|r| r.id).collect()
        };
        self.shared.forget(&ids);
        ids
    }

    /// Returns the current records, in insertion order.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            records: self.shared.store_read().snapshot(),
        }
    }

    /// Subscribes to per-record progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadProgressEvent> {
        self.shared.broadcaster.subscribe()
    }

    /// Number of records not yet in a terminal status.
    pub fn in_flight(&self) -> usize {
        *self.shared.in_flight.borrow()
    }

    /// Resolves once no record is pending or uploading.
    pub async fn wait_until_settled(&self) {
        let mut rx = self.shared.in_flight.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    /// Inserts records, then spawns exactly one worker per record.
    fn admit(&self, items: Vec<IntakeItem>) -> Vec<UploadId> {
        if items.is_empty() {
            return Vec::new();
        }

        let ids: Vec<UploadId> = items.iter().map(|i| i.record.id).collect();

        {
            let mut files = self.shared.files();
            for item in &items {
                files.insert(item.record.id, item.file.clone());
            }
        }

        // Held from insertion until every handle is registered, so neither a
        // fast terminal event nor a concurrent remove can miss a worker.
        let mut workers = self.shared.workers();

        {
            let mut store = self.shared.store_write();
            store.insert(items.iter().map(|i| i.record.clone()));
            for item in &items {
                self.shared.publish(&store, UploadPhase::Queued, &item.record);
            }
        }

        for item in items {
            let id = item.record.id;
            let worker =
                UploadWorker::new(id, item.file, Arc::clone(&self.transport), self.events.clone());
            let handle = worker.spawn();
            workers.insert(id, handle.abort_handle());
        }

        ids
    }
}

impl Drop for UploadTracker {
    fn drop(&mut self) {
        self.event_loop.abort();
        for handle in self.shared.workers().values() {
            handle.abort();
        }
    }
}

async fn run_event_loop(shared: Arc<Shared>, mut receiver: mpsc::UnboundedReceiver<WorkerMessage>) {
    debug!("Upload event loop started");
    while let Some(message) = receiver.recv().await {
        shared.apply(message);
    }
    debug!("Upload event loop stopped");
}
