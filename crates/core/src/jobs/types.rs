//! Types for edit-job gateway operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during job gateway operations.
#[derive(Debug, Error)]
pub enum JobError {
    /// The backend rejected job creation.
    #[error("Failed to start job: {0}")]
    Start(String),

    /// A status fetch failed. Transient; tolerated during polling.
    #[error("Failed to fetch job: {0}")]
    Fetch(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,
}

/// Status of a remote edit job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Returns true for statuses from which no further transition occurs.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Returns the string representation used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// Output of a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Storage key of the rendered output.
    pub output_key: String,
    /// Number of clips assembled into the output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clips_count: Option<u32>,
}

/// Snapshot of a remote edit job.
///
/// Owned by the backend; the client holds a read-only cached copy that is
/// replaced wholesale on each fetch, never partially merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub project_id: i64,
    pub status: JobStatus,
    /// Progress percentage (0-100).
    #[serde(default)]
    pub progress: f32,
    /// Present only when status is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Present only when status is `completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Trait for the edit-job gateway.
#[async_trait]
pub trait JobGateway: Send + Sync {
    /// Request job creation for a project. Returns the initial snapshot.
    async fn start_edit(&self, project_id: i64) -> Result<Job, JobError>;

    /// Fetch a job snapshot by id.
    async fn get_job(&self, job_id: i64) -> Result<Job, JobError>;

    /// Fetch the most recent job for a project. A project with no job yet
    /// is a normal empty result, not an error.
    async fn latest_job(&self, project_id: i64) -> Result<Option<Job>, JobError>;
}
