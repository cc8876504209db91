//! Edit job lifecycle integration tests.
//!
//! These tests drive the tracker end to end against the mock gateway:
//! start an edit, sample it at a fixed cadence, and stop on a terminal
//! status or external cancellation.

use std::sync::Arc;
use std::time::Duration;

use cutroom_core::{
    testing::{job_snapshot, MockJobGateway},
    JobStatus, JobTracker, PollHandle,
};

const TICK: Duration = Duration::from_millis(10);

fn harness() -> (Arc<MockJobGateway>, JobTracker) {
    let gateway = Arc::new(MockJobGateway::new());
    let tracker = JobTracker::new(gateway.clone());
    (gateway, tracker)
}

/// Wait until the poll loop reports itself finished.
async fn wait_finished(handle: &PollHandle) {
    for _ in 0..200 {
        if handle.is_finished() {
            return;
        }
        tokio::time::sleep(TICK).await;
    }
    panic!("poll loop did not finish in time");
}

#[tokio::test]
async fn test_start_and_poll_to_completion() {
    let (gateway, tracker) = harness();

    gateway
        .set_start_job(job_snapshot(42, 9, JobStatus::Pending, 0.0))
        .await;
    gateway
        .enqueue_fetch(job_snapshot(42, 9, JobStatus::Processing, 40.0))
        .await;
    gateway
        .enqueue_fetch(job_snapshot(42, 9, JobStatus::Completed, 100.0))
        .await;

    let job = tracker.start_edit(9).await.unwrap();
    assert_eq!(job.id, 42);
    assert_eq!(tracker.snapshot().await.job.unwrap().status, JobStatus::Pending);

    let handle = tracker.poll_job_status(42, TICK);
    wait_finished(&handle).await;

    let snapshot = tracker.snapshot().await;
    let job = snapshot.job.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100.0);
    assert!(snapshot.error.is_none());

    // The loop stops in the same tick that observed the terminal status.
    let fetches = gateway.fetch_count().await;
    assert_eq!(fetches, 2);
    tokio::time::sleep(TICK * 5).await;
    assert_eq!(gateway.fetch_count().await, fetches);
}

#[tokio::test]
async fn test_poll_stops_on_failed_job() {
    let (gateway, tracker) = harness();
    gateway
        .enqueue_fetch(job_snapshot(7, 1, JobStatus::Failed, 55.0))
        .await;

    let handle = tracker.poll_job_status(7, TICK);
    wait_finished(&handle).await;

    let job = tracker.snapshot().await.job.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("render failed"));
}

#[tokio::test]
async fn test_transient_fetch_error_does_not_stop_polling() {
    let (gateway, tracker) = harness();
    gateway
        .enqueue_fetch(job_snapshot(5, 2, JobStatus::Processing, 10.0))
        .await;
    gateway.enqueue_fetch_error("gateway timeout").await;
    gateway
        .enqueue_fetch(job_snapshot(5, 2, JobStatus::Completed, 100.0))
        .await;

    let handle = tracker.poll_job_status(5, TICK);
    wait_finished(&handle).await;

    let snapshot = tracker.snapshot().await;
    assert_eq!(snapshot.job.unwrap().status, JobStatus::Completed);
    assert_eq!(gateway.fetch_count().await, 3);
}

#[tokio::test]
async fn test_cancel_stops_the_loop() {
    let (gateway, tracker) = harness();
    gateway
        .enqueue_fetch(job_snapshot(3, 4, JobStatus::Processing, 20.0))
        .await;

    let handle = tracker.poll_job_status(3, TICK);
    tokio::time::sleep(TICK * 4).await;

    handle.cancel();
    assert!(handle.is_cancelled());
    // Cancelling twice is a no-op.
    handle.cancel();

    wait_finished(&handle).await;
    let fetches = gateway.fetch_count().await;
    tokio::time::sleep(TICK * 5).await;
    assert_eq!(gateway.fetch_count().await, fetches);

    // The last observed snapshot survives cancellation.
    assert_eq!(
        tracker.snapshot().await.job.unwrap().status,
        JobStatus::Processing
    );
}

#[tokio::test]
async fn test_resume_from_latest_job() {
    let (gateway, tracker) = harness();
    gateway
        .set_latest(Some(job_snapshot(11, 6, JobStatus::Processing, 75.0)))
        .await;

    let job = tracker.fetch_latest(6).await.unwrap().unwrap();
    assert_eq!(job.id, 11);

    gateway
        .enqueue_fetch(job_snapshot(11, 6, JobStatus::Completed, 100.0))
        .await;
    let handle = tracker.poll_job_status(job.id, TICK);
    wait_finished(&handle).await;

    assert_eq!(
        tracker.snapshot().await.job.unwrap().status,
        JobStatus::Completed
    );
}

#[tokio::test]
async fn test_no_latest_job_is_not_an_error() {
    let (gateway, tracker) = harness();
    gateway.set_latest(None).await;

    let result = tracker.fetch_latest(1).await.unwrap();
    assert!(result.is_none());

    let snapshot = tracker.snapshot().await;
    assert!(snapshot.job.is_none());
    assert!(snapshot.error.is_none());
    assert_eq!(gateway.latest_count().await, 1);
}
