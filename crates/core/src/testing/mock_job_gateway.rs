//! Mock job gateway for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::jobs::{Job, JobError, JobGateway};

enum Scripted {
    Job(Job),
    Error(String),
}

/// Mock implementation of the JobGateway trait.
///
/// `get_job` responses are scripted as a queue: each fetch consumes the
/// front entry, and an exhausted queue repeats the last job. This makes
/// "exactly N ticks fired" assertions possible via [`fetch_count`].
///
/// [`fetch_count`]: MockJobGateway::fetch_count
pub struct MockJobGateway {
    start_job: Arc<RwLock<Option<Job>>>,
    start_error: Arc<RwLock<Option<String>>>,
    latest: Arc<RwLock<Option<Job>>>,
    latest_error: Arc<RwLock<Option<String>>>,
    fetch_script: Arc<RwLock<VecDeque<Scripted>>>,
    last_fetched: Arc<RwLock<Option<Job>>>,
    fetch_count: Arc<RwLock<usize>>,
    start_count: Arc<RwLock<usize>>,
    latest_count: Arc<RwLock<usize>>,
}

impl Default for MockJobGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockJobGateway {
    /// Create a new mock job gateway with no scripted responses.
    pub fn new() -> Self {
        Self {
            start_job: Arc::new(RwLock::new(None)),
            start_error: Arc::new(RwLock::new(None)),
            latest: Arc::new(RwLock::new(None)),
            latest_error: Arc::new(RwLock::new(None)),
            fetch_script: Arc::new(RwLock::new(VecDeque::new())),
            last_fetched: Arc::new(RwLock::new(None)),
            fetch_count: Arc::new(RwLock::new(0)),
            start_count: Arc::new(RwLock::new(0)),
            latest_count: Arc::new(RwLock::new(0)),
        }
    }

    /// Set the job returned by `start_edit`.
    pub async fn set_start_job(&self, job: Job) {
        *self.start_job.write().await = Some(job);
        *self.start_error.write().await = None;
    }

    /// Make `start_edit` fail.
    pub async fn fail_start(&self, reason: &str) {
        *self.start_error.write().await = Some(reason.to_string());
    }

    /// Set the job returned by `latest_job`; `None` means no job exists.
    pub async fn set_latest(&self, job: Option<Job>) {
        *self.latest.write().await = job;
        *self.latest_error.write().await = None;
    }

    /// Make `latest_job` fail.
    pub async fn fail_latest(&self, reason: &str) {
        *self.latest_error.write().await = Some(reason.to_string());
    }

    /// Queue a snapshot for the next `get_job` call.
    pub async fn enqueue_fetch(&self, job: Job) {
        self.fetch_script.write().await.push_back(Scripted::Job(job));
    }

    /// Queue a fetch failure for the next `get_job` call.
    pub async fn enqueue_fetch_error(&self, reason: &str) {
        self.fetch_script
            .write()
            .await
            .push_back(Scripted::Error(reason.to_string()));
    }

    /// How many times `get_job` was called.
    pub async fn fetch_count(&self) -> usize {
        *self.fetch_count.read().await
    }

    /// How many times `start_edit` was called.
    pub async fn start_count(&self) -> usize {
        *self.start_count.read().await
    }

    /// How many times `latest_job` was called.
    pub async fn latest_count(&self) -> usize {
        *self.latest_count.read().await
    }
}

#[async_trait]
impl JobGateway for MockJobGateway {
    async fn start_edit(&self, project_id: i64) -> Result<Job, JobError> {
        *self.start_count.write().await += 1;

        if let Some(reason) = self.start_error.read().await.clone() {
            return Err(JobError::Start(reason));
        }

        match self.start_job.read().await.clone() {
            Some(job) => Ok(job),
            None => Err(JobError::Start(format!(
                "no start job scripted for project {}",
                project_id
            ))),
        }
    }

    async fn get_job(&self, job_id: i64) -> Result<Job, JobError> {
        *self.fetch_count.write().await += 1;

        let scripted = self.fetch_script.write().await.pop_front();
        match scripted {
            Some(Scripted::Job(job)) => {
                *self.last_fetched.write().await = Some(job.clone());
                Ok(job)
            }
            Some(Scripted::Error(reason)) => Err(JobError::Fetch(reason)),
            None => match self.last_fetched.read().await.clone() {
                Some(job) => Ok(job),
                None => Err(JobError::Fetch(format!(
                    "no scripted response for job {}",
                    job_id
                ))),
            },
        }
    }

    async fn latest_job(&self, _project_id: i64) -> Result<Option<Job>, JobError> {
        *self.latest_count.write().await += 1;

        if let Some(reason) = self.latest_error.read().await.clone() {
            return Err(JobError::Fetch(reason));
        }

        Ok(self.latest.read().await.clone())
    }
}
