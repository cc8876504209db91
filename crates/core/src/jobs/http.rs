//! HTTP job gateway implementation.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use tracing::debug;

use crate::context::ApiContext;

use super::{Job, JobError, JobGateway};

/// Job gateway backed by the backend REST API.
pub struct HttpJobGateway {
    ctx: ApiContext,
}

impl HttpJobGateway {
    /// Create a new gateway over the given request context.
    pub fn new(ctx: ApiContext) -> Self {
        Self { ctx }
    }
}

/// Map a transport error from a status fetch.
fn map_fetch_err(e: reqwest::Error) -> JobError {
    if e.is_timeout() {
        JobError::Timeout
    } else if e.is_connect() {
        JobError::ConnectionFailed(e.to_string())
    } else {
        JobError::Fetch(e.to_string())
    }
}

#[async_trait]
impl JobGateway for HttpJobGateway {
    async fn start_edit(&self, project_id: i64) -> Result<Job, JobError> {
        let url = self
            .ctx
            .url(&format!("/api/jobs/project/{}/start-edit", project_id));

        let request = self.ctx.http().post(&url).json(&json!({}));
        let response = self.ctx.authorize(request).send().await.map_err(|e| {
            if e.is_timeout() {
                JobError::Timeout
            } else if e.is_connect() {
                JobError::ConnectionFailed(e.to_string())
            } else {
                JobError::Start(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JobError::Start(format!("HTTP {}: {}", status, body)));
        }

        let job: Job = response
            .json()
            .await
            .map_err(|e| JobError::Start(format!("Failed to parse response: {}", e)))?;

        debug!("Started edit job {} for project {}", job.id, project_id);
        Ok(job)
    }

    async fn get_job(&self, job_id: i64) -> Result<Job, JobError> {
        let url = self.ctx.url(&format!("/api/jobs/{}", job_id));

        let request = self.ctx.http().get(&url);
        let response = self
            .ctx
            .authorize(request)
            .send()
            .await
            .map_err(map_fetch_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JobError::Fetch(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| JobError::Fetch(format!("Failed to parse response: {}", e)))
    }

    async fn latest_job(&self, project_id: i64) -> Result<Option<Job>, JobError> {
        let url = self
            .ctx
            .url(&format!("/api/jobs/project/{}/latest", project_id));

        let request = self.ctx.http().get(&url);
        let response = self
            .ctx
            .authorize(request)
            .send()
            .await
            .map_err(map_fetch_err)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            // No job created yet. Normal empty result.
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JobError::Fetch(format!("HTTP {}: {}", status, body)));
        }

        let job: Job = response
            .json()
            .await
            .map_err(|e| JobError::Fetch(format!("Failed to parse response: {}", e)))?;

        Ok(Some(job))
    }
}
