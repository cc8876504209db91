//! Types for the upload pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::storage::AssetRecord;

/// Coarse media classification derived from the declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Classify from a declared MIME type: `video/*` is video, everything
    /// else is treated as an image.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("video") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    /// Returns the string representation used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

/// A local file queued for upload.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// State of one file's journey through the pipeline. Never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Queued,
    RequestingCredentials,
    Transferring,
    Confirming,
    Complete,
    Failed,
}

impl TaskState {
    /// Returns true once the task has settled (success or failure).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Complete | TaskState::Failed)
    }

    /// Returns the string representation for reporting.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Queued => "queued",
            TaskState::RequestingCredentials => "requesting_credentials",
            TaskState::Transferring => "transferring",
            TaskState::Confirming => "confirming",
            TaskState::Complete => "complete",
            TaskState::Failed => "failed",
        }
    }
}

/// One file's progress through the three-step upload protocol.
///
/// `storage_key` is set exactly when credentials have been issued, so it is
/// `None` in `Queued` and `RequestingCredentials` and `Some` in every later
/// state reached without an issuance failure. `error` is present only when
/// the task failed. Tasks live only for the duration of their batch.
#[derive(Debug, Clone, Serialize)]
pub struct UploadTask {
    pub file_name: String,
    pub content_type: String,
    pub file_size: u64,
    pub kind: MediaKind,
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetRecord>,
}

impl UploadTask {
    /// Create a queued task for a file.
    pub fn queued(file: &LocalFile) -> Self {
        Self {
            file_name: file.name.clone(),
            content_type: file.content_type.clone(),
            file_size: file.size(),
            kind: MediaKind::from_content_type(&file.content_type),
            state: TaskState::Queued,
            storage_key: None,
            error: None,
            asset: None,
        }
    }
}

/// Aggregate result of a batch submission.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub tasks: Vec<UploadTask>,
}

impl BatchOutcome {
    pub fn complete_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.state == TaskState::Complete)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.state == TaskState::Failed)
            .count()
    }

    pub fn all_complete(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Callback invoked once per file when it settles, so a presentation layer
/// can refresh incrementally instead of waiting for the whole batch.
#[async_trait]
pub trait BatchObserver: Send + Sync {
    async fn task_settled(&self, index: usize, task: &UploadTask);
}

/// Observer that ignores all notifications.
pub struct NoopObserver;

#[async_trait]
impl BatchObserver for NoopObserver {
    async fn task_settled(&self, _index: usize, _task: &UploadTask) {}
}
