//! Job tracker implementation.
//!
//! Owns the cached job snapshot and samples the job gateway at a fixed
//! cadence until a terminal status or explicit cancellation. Each tick's
//! fetch is awaited inside the loop body, so a slow response delays the
//! next tick instead of overlapping it; the cached snapshot can never be
//! overwritten by a stale out-of-order response.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::jobs::{Job, JobError, JobGateway};

/// Default sampling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Cloned view of the tracker state for presentation.
#[derive(Debug, Clone, Default)]
pub struct TrackerSnapshot {
    /// Cached job snapshot, replaced wholesale on each update.
    pub job: Option<Job>,
    /// Last operation error, if any.
    pub error: Option<String>,
    /// Whether a foreground operation is in flight.
    pub loading: bool,
}

#[derive(Default)]
struct TrackerState {
    job: Option<Job>,
    error: Option<String>,
    loading: bool,
}

/// Handle to a running polling session.
///
/// Exactly one sampler is associated with a handle. `cancel` stops it
/// immediately regardless of job status; calling it more than once is a
/// no-op. A dropped handle does NOT stop the sampler; it keeps running
/// until a terminal status, so observers tearing down must cancel.
pub struct PollHandle {
    cancelled: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl PollHandle {
    /// Stop the sampler. Idempotent.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        // The sampler may already have stopped on its own; a closed
        // channel is fine.
        let _ = self.shutdown_tx.send(());
    }

    /// Whether `cancel` has been invoked.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether the sampler loop has exited (terminal status or cancel).
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Tracks one project's edit job: start, latest-lookup, and fixed-cadence
/// polling to a terminal status.
pub struct JobTracker {
    gateway: Arc<dyn JobGateway>,
    state: Arc<RwLock<TrackerState>>,
}

impl JobTracker {
    /// Create a new tracker over a job gateway.
    pub fn new(gateway: Arc<dyn JobGateway>) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(TrackerState::default())),
        }
    }

    /// Current state for presentation.
    pub async fn snapshot(&self) -> TrackerSnapshot {
        let state = self.state.read().await;
        TrackerSnapshot {
            job: state.job.clone(),
            error: state.error.clone(),
            loading: state.loading,
        }
    }

    /// Fetch the most recent job for a project and cache it.
    ///
    /// A project with no job yet is a normal empty result: the cached job
    /// is cleared and no error is recorded. Any other failure clears the
    /// cached job and records the error.
    pub async fn fetch_latest(&self, project_id: i64) -> Result<Option<Job>, JobError> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
        }

        let result = self.gateway.latest_job(project_id).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(Some(job)) => {
                state.job = Some(job.clone());
                state.error = None;
                Ok(Some(job))
            }
            Ok(None) => {
                state.job = None;
                state.error = None;
                Ok(None)
            }
            Err(e) => {
                state.job = None;
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Request job creation for a project.
    ///
    /// On success the returned snapshot (typically `pending`) is cached
    /// and returned. On failure the error is recorded and propagated to
    /// the caller, who decides how to present it.
    pub async fn start_edit(&self, project_id: i64) -> Result<Job, JobError> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
        }

        let result = self.gateway.start_edit(project_id).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(job) => {
                info!("Edit job {} started for project {}", job.id, project_id);
                state.job = Some(job.clone());
                state.error = None;
                Ok(job)
            }
            Err(e) => {
                warn!("Failed to start edit for project {}: {}", project_id, e);
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Begin sampling a job at a fixed cadence.
    ///
    /// Each tick fetches the snapshot by id and replaces the cached copy
    /// wholesale. A terminal status stops the sampler from within the same
    /// tick; no further tick fires. A fetch error is logged and tolerated:
    /// the cached snapshot is left untouched and the sampler keeps ticking
    /// at the same cadence until terminal status or cancellation.
    pub fn poll_job_status(&self, job_id: i64, interval: Duration) -> PollHandle {
        let gateway = Arc::clone(&self.gateway);
        let state = Arc::clone(&self.state);
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let loop_finished = Arc::clone(&finished);
        let loop_shutdown_tx = shutdown_tx.clone();

        tokio::spawn(async move {
            // A sender lives inside the task for the loop's lifetime, so a
            // dropped handle cannot close the channel; recv only resolves
            // on an actual cancel send.
            let _shutdown_tx = loop_shutdown_tx;
            debug!("Polling started for job {} every {:?}", job_id, interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Polling cancelled for job {}", job_id);
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        match gateway.get_job(job_id).await {
                            Ok(job) => {
                                let terminal = job.status.is_terminal();
                                let status = job.status;
                                {
                                    let mut s = state.write().await;
                                    s.job = Some(job);
                                    s.error = None;
                                }
                                if terminal {
                                    info!("Job {} reached terminal status: {}", job_id, status.as_str());
                                    break;
                                }
                            }
                            Err(e) => {
                                // Transient. Keep the cached snapshot and
                                // the cadence.
                                warn!("Failed to poll job {}: {}", job_id, e);
                            }
                        }
                    }
                }
            }
            loop_finished.store(true, Ordering::SeqCst);
        });

        PollHandle {
            cancelled,
            finished,
            shutdown_tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobStatus;
    use crate::testing::{job_snapshot, MockJobGateway};

    const TICK: Duration = Duration::from_millis(10);

    /// Sleep long enough for `n` ticks to have fired.
    async fn settle(n: u32) {
        tokio::time::sleep(TICK * n + Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_fetch_latest_caches_job() {
        let gateway = Arc::new(MockJobGateway::new());
        gateway
            .set_latest(Some(job_snapshot(7, 1, JobStatus::Processing, 40.0)))
            .await;
        let tracker = JobTracker::new(gateway);

        let job = tracker.fetch_latest(1).await.unwrap().unwrap();
        assert_eq!(job.id, 7);

        let snapshot = tracker.snapshot().await;
        assert_eq!(snapshot.job.unwrap().id, 7);
        assert!(snapshot.error.is_none());
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_fetch_latest_no_job_is_not_an_error() {
        let gateway = Arc::new(MockJobGateway::new());
        let tracker = JobTracker::new(gateway.clone());

        // Idempotent: every call returns the empty result.
        for _ in 0..3 {
            let result = tracker.fetch_latest(1).await.unwrap();
            assert!(result.is_none());
        }

        let snapshot = tracker.snapshot().await;
        assert!(snapshot.job.is_none());
        assert!(snapshot.error.is_none());
        assert_eq!(gateway.latest_count().await, 3);
    }

    #[tokio::test]
    async fn test_fetch_latest_error_clears_job_and_records_error() {
        let gateway = Arc::new(MockJobGateway::new());
        gateway
            .set_latest(Some(job_snapshot(7, 1, JobStatus::Processing, 40.0)))
            .await;
        let tracker = JobTracker::new(gateway.clone());
        tracker.fetch_latest(1).await.unwrap();

        gateway.fail_latest("backend unavailable").await;
        let result = tracker.fetch_latest(1).await;
        assert!(result.is_err());

        let snapshot = tracker.snapshot().await;
        assert!(snapshot.job.is_none());
        assert!(snapshot.error.unwrap().contains("backend unavailable"));
    }

    #[tokio::test]
    async fn test_start_edit_caches_pending_job() {
        let gateway = Arc::new(MockJobGateway::new());
        gateway
            .set_start_job(job_snapshot(3, 1, JobStatus::Pending, 0.0))
            .await;
        let tracker = JobTracker::new(gateway);

        let job = tracker.start_edit(1).await.unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        let snapshot = tracker.snapshot().await;
        assert_eq!(snapshot.job.unwrap().id, 3);
    }

    #[tokio::test]
    async fn test_start_edit_failure_propagates() {
        let gateway = Arc::new(MockJobGateway::new());
        gateway.fail_start("project has no assets").await;
        let tracker = JobTracker::new(gateway);

        let result = tracker.start_edit(1).await;
        assert!(matches!(result, Err(JobError::Start(_))));

        let snapshot = tracker.snapshot().await;
        assert!(snapshot.job.is_none());
        assert!(snapshot.error.unwrap().contains("project has no assets"));
    }

    #[tokio::test]
    async fn test_poll_stops_after_first_terminal_fetch() {
        let gateway = Arc::new(MockJobGateway::new());
        gateway
            .enqueue_fetch(job_snapshot(3, 1, JobStatus::Completed, 100.0))
            .await;
        let tracker = JobTracker::new(gateway.clone());

        let handle = tracker.poll_job_status(3, TICK);
        settle(4).await;

        // Terminal on the first tick: no second fetch fires.
        assert_eq!(gateway.fetch_count().await, 1);
        assert!(handle.is_finished());
        assert_eq!(
            tracker.snapshot().await.job.unwrap().status,
            JobStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_poll_progression_to_completed() {
        let gateway = Arc::new(MockJobGateway::new());
        gateway
            .enqueue_fetch(job_snapshot(3, 1, JobStatus::Processing, 40.0))
            .await;
        let mut completed = job_snapshot(3, 1, JobStatus::Completed, 100.0);
        completed.result = Some(crate::jobs::JobResult {
            output_key: "abc".to_string(),
            clips_count: None,
        });
        gateway.enqueue_fetch(completed).await;
        let tracker = JobTracker::new(gateway.clone());

        let handle = tracker.poll_job_status(3, TICK);
        settle(5).await;

        assert_eq!(gateway.fetch_count().await, 2);
        assert!(handle.is_finished());
        let job = tracker.snapshot().await.job.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result.unwrap().output_key, "abc");
    }

    #[tokio::test]
    async fn test_poll_tolerates_transient_errors() {
        let gateway = Arc::new(MockJobGateway::new());
        gateway
            .set_latest(Some(job_snapshot(3, 1, JobStatus::Processing, 10.0)))
            .await;
        let tracker = JobTracker::new(gateway.clone());
        tracker.fetch_latest(1).await.unwrap();

        gateway.enqueue_fetch_error("connection reset").await;
        gateway
            .enqueue_fetch(job_snapshot(3, 1, JobStatus::Completed, 100.0))
            .await;

        let handle = tracker.poll_job_status(3, TICK);

        settle(1).await;
        // After the failed tick the cached snapshot is untouched.
        let snapshot = tracker.snapshot().await;
        assert_eq!(snapshot.job.as_ref().unwrap().status, JobStatus::Processing);

        settle(4).await;
        // The next tick still fired and reached the terminal snapshot.
        assert_eq!(gateway.fetch_count().await, 2);
        assert!(handle.is_finished());
        assert_eq!(
            tracker.snapshot().await.job.unwrap().status,
            JobStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_cancel_stops_polling() {
        let gateway = Arc::new(MockJobGateway::new());
        gateway
            .enqueue_fetch(job_snapshot(3, 1, JobStatus::Processing, 10.0))
            .await;
        gateway
            .enqueue_fetch(job_snapshot(3, 1, JobStatus::Processing, 20.0))
            .await;
        let tracker = JobTracker::new(gateway.clone());

        let handle = tracker.poll_job_status(3, TICK);
        settle(1).await;
        handle.cancel();
        settle(3).await;

        assert!(handle.is_finished());
        let count = gateway.fetch_count().await;
        settle(3).await;
        // No more fetches after cancellation.
        assert_eq!(gateway.fetch_count().await, count);
    }

    #[tokio::test]
    async fn test_cancel_twice_is_noop() {
        let gateway = Arc::new(MockJobGateway::new());
        let tracker = JobTracker::new(gateway);

        let handle = tracker.poll_job_status(3, TICK);
        handle.cancel();
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());

        settle(2).await;
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_dropped_handle_keeps_sampler_running() {
        let gateway = Arc::new(MockJobGateway::new());
        for progress in [10.0, 20.0, 30.0] {
            gateway
                .enqueue_fetch(job_snapshot(3, 1, JobStatus::Processing, progress))
                .await;
        }
        gateway
            .enqueue_fetch(job_snapshot(3, 1, JobStatus::Completed, 100.0))
            .await;
        let tracker = JobTracker::new(gateway.clone());

        let handle = tracker.poll_job_status(3, TICK);
        settle(1).await;
        drop(handle);

        settle(6).await;
        // The sampler outlived the handle and ran to the terminal snapshot.
        assert_eq!(gateway.fetch_count().await, 4);
        assert_eq!(
            tracker.snapshot().await.job.unwrap().status,
            JobStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_cancel_after_terminal_is_noop() {
        let gateway = Arc::new(MockJobGateway::new());
        gateway
            .enqueue_fetch(job_snapshot(3, 1, JobStatus::Failed, 0.0))
            .await;
        let tracker = JobTracker::new(gateway);

        let handle = tracker.poll_job_status(3, TICK);
        settle(3).await;
        assert!(handle.is_finished());

        // The sampler already stopped on its own.
        handle.cancel();
    }
}
