//! Upload orchestrator implementation.
//!
//! Drives a batch of local files through the three-step protocol:
//! credential issuance, direct transfer, confirmation. Files are processed
//! strictly sequentially: file N+1's credential request is not issued until
//! file N has settled, so at most one credential/transfer pair is in
//! flight at any time.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::storage::{StorageError, StorageGateway};

use super::types::{BatchObserver, BatchOutcome, LocalFile, TaskState, UploadTask};

/// Drives upload batches against a storage gateway.
pub struct UploadOrchestrator {
    gateway: Arc<dyn StorageGateway>,
}

impl UploadOrchestrator {
    /// Create a new orchestrator.
    pub fn new(gateway: Arc<dyn StorageGateway>) -> Self {
        Self { gateway }
    }

    /// Submit a batch of files for a project.
    ///
    /// Each file is independent: one file failing at any step marks that
    /// task `Failed` and the batch moves on to the next file. Step errors
    /// are recorded on the task, never returned as a batch-level error.
    /// The observer is invoked exactly once per file when it settles.
    pub async fn submit_batch(
        &self,
        project_id: i64,
        files: Vec<LocalFile>,
        observer: &dyn BatchObserver,
    ) -> BatchOutcome {
        info!("Starting upload batch of {} files for project {}", files.len(), project_id);

        let mut tasks = Vec::with_capacity(files.len());

        for (index, file) in files.into_iter().enumerate() {
            let mut task = UploadTask::queued(&file);

            match self.run_pipeline(project_id, file, &mut task).await {
                Ok(()) => {
                    debug!("Upload complete: {} ({})", task.file_name, task.kind.as_str());
                }
                Err(e) => {
                    warn!("Upload failed for {}: {}", task.file_name, e);
                    task.state = TaskState::Failed;
                    task.error = Some(e.to_string());
                }
            }

            observer.task_settled(index, &task).await;
            tasks.push(task);
        }

        let outcome = BatchOutcome { tasks };
        info!(
            "Upload batch settled for project {}: {} complete, {} failed",
            project_id,
            outcome.complete_count(),
            outcome.failed_count()
        );
        outcome
    }

    /// Run one file through the three steps, advancing the task state as
    /// each step begins. Credentials are consumed exactly once and never
    /// outlive this call.
    async fn run_pipeline(
        &self,
        project_id: i64,
        file: LocalFile,
        task: &mut UploadTask,
    ) -> Result<(), StorageError> {
        task.state = TaskState::RequestingCredentials;
        let credentials = self
            .gateway
            .request_credentials(project_id, &file.name, &file.content_type, file.size())
            .await?;
        task.storage_key = Some(credentials.storage_key.clone());

        task.state = TaskState::Transferring;
        self.gateway
            .transfer(&credentials, &file.name, &file.content_type, file.bytes)
            .await?;

        task.state = TaskState::Confirming;
        let asset = self
            .gateway
            .confirm_upload(
                project_id,
                &credentials.storage_key,
                task.kind.as_str(),
                &task.file_name,
                task.file_size,
            )
            .await?;

        task.asset = Some(asset);
        task.state = TaskState::Complete;
        Ok(())
    }
}
