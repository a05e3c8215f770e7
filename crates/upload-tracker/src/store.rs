//! Insertion-ordered store of upload records.

use std::collections::HashSet;

use crate::record::{Transition, UploadEvent, UploadId, UploadRecord};

/// Result of applying a worker event to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The record changed; carries the updated copy.
    Applied(UploadRecord),
    /// The event is not valid for the record's status; nothing changed.
    Ignored,
    /// The record was removed earlier; nothing changed.
    Missing,
}

/// Ordered mapping from id to record.
///
/// Every id ever inserted is remembered, so removed ids are never reissued
/// and stray events can be told apart from events for unknown ids.
#[derive(Debug, Default)]
pub struct UploadStore {
    records: Vec<UploadRecord>,
    issued: HashSet<UploadId>,
}

impl UploadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends records in order.
    ///
    /// # Panics
    /// Panics if any id has been held by this store before.
    pub fn insert<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = UploadRecord>,
    {
        for record in records {
            assert!(
                self.issued.insert(record.id),
                "upload id {} inserted twice",
                record.id
            );
            self.records.push(record);
        }
    }

    /// Applies one event to the record with the given id.
    ///
    /// # Panics
    /// Panics if `id` was never inserted into this store.
    pub fn apply_event(&mut self, id: UploadId, event: &UploadEvent) -> ApplyOutcome {
        assert!(
            self.issued.contains(&id),
            "event {:?} for upload id {} that was never inserted",
            event,
            id
        );

        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            log::debug!("Dropping {:?} for removed upload {}", event, id);
            return ApplyOutcome::Missing;
        };

        match record.apply(event) {
            Transition::Applied => ApplyOutcome::Applied(record.clone()),
            Transition::Invalid => {
                log::warn!(
                    "Ignoring {:?} for upload {} in status {}",
                    event,
                    id,
                    record.status
                );
                ApplyOutcome::Ignored
            }
        }
    }

    /// Removes a record. Returns the removed record, if it was present.
    pub fn remove(&mut self, id: UploadId) -> Option<UploadRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }

    /// Removes every terminal record and returns them in order.
    pub fn clear_finished(&mut self) -> Vec<UploadRecord> {
        let (finished, active): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.records)
                .into_iter()
                .partition(|r| r.is_finished());
        self.records = active;
        finished
    }

    pub fn get(&self, id: UploadId) -> Option<&UploadRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Returns true if `id` was ever inserted, even if since removed.
    pub fn was_issued(&self, id: UploadId) -> bool {
        self.issued.contains(&id)
    }

    /// Number of records not yet in a terminal status.
    pub fn in_flight(&self) -> usize {
        self.records.iter().filter(|r| !r.is_finished()).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copies the current records, in insertion order.
    pub fn snapshot(&self) -> Vec<UploadRecord> {
        self.records.clone()
    }
}
