//! End-to-end tests driving the tracker through scripted transports.

mod common;

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

use common::{files, ConfigBuilder, FileHandleBuilder, ScriptedTransport, Step};
use upload_tracker::{
    FileHandle, RejectionReason, UploadId, UploadPhase, UploadProgressEvent, UploadStatus,
    UploadTracker,
};

fn tracker_with(transport: ScriptedTransport) -> (UploadTracker, Arc<ScriptedTransport>) {
    let transport = Arc::new(transport);
    let tracker = UploadTracker::new(&ConfigBuilder::new().build(), transport.clone());
    (tracker, transport)
}

fn drain(rx: &mut Receiver<UploadProgressEvent>) -> Vec<UploadProgressEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty) => return events,
            Err(e) => panic!("unexpected receive error: {:?}", e),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_scenario_a_pending_then_uploading_then_progress() {
    let script = vec![
        Step::Pause(100),
        Step::Tick(10),
        Step::Tick(10),
        Step::Tick(10),
        Step::Pause(10_000),
        Step::Succeed,
    ];
    let (tracker, _) = tracker_with(ScriptedTransport::new().script("a.pdf", script));

    let outcome = tracker.start_batch(vec![FileHandleBuilder::new("a.pdf").size_bytes(2048).build()]);
    let id = outcome.accepted[0];

    let record = tracker.snapshot().get(id).cloned().unwrap();
    assert_eq!(record.status, UploadStatus::Pending);
    assert_eq!(record.progress, 0);
    assert_eq!(record.size_bytes, 2048);
    assert_eq!(record.mime_type, "application/pdf");
    assert!(record.error.is_none());

    tokio::time::sleep(Duration::from_millis(50)).await;
    let record = tracker.snapshot().get(id).cloned().unwrap();
    assert_eq!(record.status, UploadStatus::Uploading);
    assert_eq!(record.progress, 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let record = tracker.snapshot().get(id).cloned().unwrap();
    assert_eq!(record.status, UploadStatus::Uploading);
    assert_eq!(record.progress, 30);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_b_full_progress_then_completed() {
    let (tracker, _) = tracker_with(ScriptedTransport::new());
    let outcome = tracker.start_batch(files(&["a.pdf"]));
    tracker.wait_until_settled().await;

    let snapshot = tracker.snapshot();
    let record = snapshot.get(outcome.accepted[0]).unwrap();
    assert_eq!(record.status, UploadStatus::Succeeded);
    assert_eq!(record.progress, 100);
    assert!(record.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_scenario_c_failure_forces_full_progress() {
    let mut script: Vec<Step> = (0..7).map(|_| Step::Tick(10)).collect();
    script.push(Step::Pause(300));
    script.push(Step::Fail("network error"));
    let (tracker, _) = tracker_with(ScriptedTransport::new().script("a.pdf", script));

    let outcome = tracker.start_batch(files(&["a.pdf"]));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(tracker.snapshot().get(outcome.accepted[0]).unwrap().progress, 70);

    tracker.wait_until_settled().await;
    let snapshot = tracker.snapshot();
    let record = snapshot.get(outcome.accepted[0]).unwrap();
    assert_eq!(record.status, UploadStatus::Failed);
    assert_eq!(record.progress, 100);
    assert_eq!(record.error.as_deref(), Some("network error"));
}

#[tokio::test(start_paused = true)]
async fn test_scenario_d_remove_mid_flight() {
    let (tracker, transport) = tracker_with(ScriptedTransport::new());
    let mut rx = tracker.subscribe();
    let outcome = tracker.start_batch(files(&["a.pdf", "b.pdf"]));
    let removed = outcome.accepted[0];

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(
        tracker.snapshot().get(removed).unwrap().status,
        UploadStatus::Uploading
    );
    assert!(tracker.remove(removed));

    tracker.wait_until_settled().await;
    tokio::time::sleep(Duration::from_millis(5000)).await;

    let snapshot = tracker.snapshot();
    assert!(!snapshot.contains(removed));
    assert_eq!(snapshot.len(), 1);
    assert_eq!(transport.attempts("a.pdf"), 1);

    let events = drain(&mut rx);
    let after_removal: Vec<&UploadProgressEvent> = events
        .iter()
        .filter(|e| e.upload_id == removed)
        .skip_while(|e| e.phase != UploadPhase::Removed)
        .collect();
    assert_eq!(after_removal.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_e_oversized_file_is_rejected() {
    let (tracker, transport) = tracker_with(ScriptedTransport::new());
    let outcome = tracker.start_batch(vec![FileHandleBuilder::new("scan.pdf").size_mib(15).build()]);

    assert!(outcome.accepted.is_empty());
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].name, "scan.pdf");
    assert!(matches!(
        outcome.rejected[0].reason,
        RejectionReason::TooLarge { .. }
    ));
    assert!(tracker.snapshot().is_empty());

    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(transport.attempts("scan.pdf"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_mixed_batch_keeps_input_order() {
    let (tracker, _) = tracker_with(ScriptedTransport::new());
    let outcome = tracker.start_batch(vec![
        FileHandleBuilder::new("one.pdf").build(),
        FileHandleBuilder::new("virus.exe").build(),
        FileHandleBuilder::new("two.DOCX").picked().build(),
        FileHandleBuilder::new("three.doc").build(),
    ]);

    assert_eq!(outcome.accepted.len(), 3);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(
        outcome.rejected[0].reason,
        RejectionReason::UnsupportedType {
            extension: Some("exe".to_string())
        }
    );

    let names: Vec<String> = tracker
        .snapshot()
        .records
        .iter()
        .map(|r| r.name.clone())
        .collect();
    assert_eq!(names, vec!["one.pdf", "two.DOCX", "three.doc"]);
}

#[tokio::test(start_paused = true)]
async fn test_batch_ids_are_fresh_across_batches() {
    let (tracker, _) = tracker_with(ScriptedTransport::new());
    let mut seen: HashSet<UploadId> = HashSet::new();

    for _ in 0..3 {
        let outcome = tracker.start_batch(files(&["a.pdf", "b.pdf", "c.pdf", "d.pdf"]));
        assert_eq!(outcome.accepted.len(), 4);
        for id in outcome.accepted {
            assert!(seen.insert(id), "id {} issued twice", id);
        }
        tracker.clear_finished();
        tracker.wait_until_settled().await;
        tracker.clear_finished();
    }
    assert!(tracker.snapshot().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_progress_is_monotonic_with_single_terminal_event() {
    let transport = ScriptedTransport::new()
        .script(
            "fast.pdf",
            vec![Step::Tick(60), Step::Pause(50), Step::Tick(60), Step::Succeed],
        )
        .script(
            "slow.pdf",
            vec![Step::Pause(500), Step::Tick(25), Step::Pause(500), Step::Fail("timeout")],
        );
    let (tracker, _) = tracker_with(transport);
    let mut rx = tracker.subscribe();
    tracker.start_batch(files(&["fast.pdf", "slow.pdf", "c.pdf"]));
    tracker.wait_until_settled().await;

    let mut by_id: HashMap<UploadId, Vec<UploadProgressEvent>> = HashMap::new();
    for event in drain(&mut rx) {
        by_id.entry(event.upload_id).or_default().push(event);
    }
    assert_eq!(by_id.len(), 3);

    for events in by_id.values() {
        assert_eq!(events[0].phase, UploadPhase::Queued);
        assert_eq!(events[1].phase, UploadPhase::Started);

        let progress: Vec<u8> = events.iter().map(|e| e.progress).collect();
        assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{:?}", progress);

        let terminals = events
            .iter()
            .filter(|e| matches!(e.phase, UploadPhase::Completed | UploadPhase::Failed))
            .count();
        assert_eq!(terminals, 1);
        let last = events.last().unwrap();
        assert!(matches!(last.phase, UploadPhase::Completed | UploadPhase::Failed));
        assert_eq!(last.progress, 100);
    }
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_failure_reuses_file_handle() {
    let transport = ScriptedTransport::new().script("a.pdf", vec![Step::Fail("network error")]);
    let (tracker, transport) = tracker_with(transport);

    let outcome = tracker.start_batch(files(&["a.pdf"]));
    tracker.wait_until_settled().await;
    let failed = outcome.accepted[0];

    let retried = tracker.retry(failed).unwrap();
    tracker.wait_until_settled().await;
    assert_eq!(transport.attempts("a.pdf"), 2);

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.len(), 1);
    let record = snapshot.get(retried).unwrap();
    assert_eq!(record.retry_of, Some(failed));
    assert_eq!(record.status, UploadStatus::Failed);

    assert_eq!(tracker.retry(failed), None);
}

#[tokio::test(start_paused = true)]
async fn test_noop_operations_leave_snapshot_unchanged() {
    let (tracker, _) = tracker_with(ScriptedTransport::new());
    tracker.start_batch(files(&["a.pdf", "b.pdf"]));
    tracker.wait_until_settled().await;

    let before = tracker.snapshot();
    assert!(!tracker.remove(UploadId::new()));
    assert_eq!(tracker.retry(UploadId::new()), None);
    tracker.start_batch(Vec::<FileHandle>::new());
    assert_eq!(tracker.snapshot(), before);
}

#[tokio::test(start_paused = true)]
async fn test_file_from_disk_is_uploaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Report.PDF");
    std::fs::write(&path, vec![0u8; 4096]).unwrap();

    let (tracker, _) = tracker_with(ScriptedTransport::new());
    let handle = FileHandle::from_path(&path).unwrap();
    let outcome = tracker.start_batch(vec![handle]);
    tracker.wait_until_settled().await;

    let snapshot = tracker.snapshot();
    let record = snapshot.get(outcome.accepted[0]).unwrap();
    assert_eq!(record.name, "Report.PDF");
    assert_eq!(record.size_bytes, 4096);
    assert_eq!(record.status, UploadStatus::Succeeded);
}
