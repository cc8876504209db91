//! Testing utilities and mock implementations.
//!
//! Mock gateways for the storage and job services, allowing the upload
//! orchestrator and the job tracker to be exercised without real
//! infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use cutroom_core::testing::{MockJobGateway, MockStorageGateway, job_snapshot};
//!
//! let storage = MockStorageGateway::new();
//! storage.fail_transfer_for("big.mp4", "connection reset").await;
//!
//! let jobs = MockJobGateway::new();
//! jobs.enqueue_fetch(job_snapshot(1, 1, JobStatus::Completed, 100.0)).await;
//! ```

mod mock_job_gateway;
mod mock_storage_gateway;

pub use mock_job_gateway::MockJobGateway;
pub use mock_storage_gateway::MockStorageGateway;

use crate::jobs::{Job, JobStatus};

/// Create a test job snapshot with reasonable defaults.
pub fn job_snapshot(id: i64, project_id: i64, status: JobStatus, progress: f32) -> Job {
    Job {
        id,
        project_id,
        status,
        progress,
        error: match status {
            JobStatus::Failed => Some("render failed".to_string()),
            _ => None,
        },
        result: None,
        started_at: None,
        completed_at: None,
        created_at: None,
    }
}
