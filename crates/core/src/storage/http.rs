//! HTTP storage gateway implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::UploadConfig;
use crate::context::ApiContext;

use super::{AssetRecord, StorageError, StorageGateway, UploadCredentials};

/// Storage gateway backed by the backend REST API and direct
/// presigned-endpoint transfers.
pub struct HttpStorageGateway {
    ctx: ApiContext,
    /// Separate client for direct transfers; media files need a much
    /// longer timeout than API calls.
    transfer_client: Client,
}

impl HttpStorageGateway {
    /// Create a new gateway over the given request context.
    pub fn new(ctx: ApiContext, upload_config: &UploadConfig) -> Self {
        let transfer_client = Client::builder()
            .timeout(Duration::from_secs(upload_config.transfer_timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            ctx,
            transfer_client,
        }
    }
}

#[derive(Debug, Serialize)]
struct PresignedUrlRequest<'a> {
    filename: &'a str,
    content_type: &'a str,
    file_size: u64,
}

/// Credential response. `presigned_url` and `storage_key` are lifted out;
/// every other scalar field (string, number, or bool, stringified) must be
/// echoed back in the transfer body. Nested values are dropped.
#[derive(Debug, Deserialize)]
struct PresignedUrlResponse {
    presigned_url: String,
    storage_key: String,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

impl PresignedUrlResponse {
    fn into_credentials(self) -> UploadCredentials {
        let extra_fields = self
            .extra
            .into_iter()
            .filter_map(|(name, value)| match value {
                Value::String(s) => Some((name, s)),
                Value::Number(n) => Some((name, n.to_string())),
                Value::Bool(b) => Some((name, b.to_string())),
                _ => None,
            })
            .collect();

        UploadCredentials {
            transfer_endpoint: self.presigned_url,
            storage_key: self.storage_key,
            extra_fields,
        }
    }
}

/// Map a transport error from an API call.
fn map_send_err(e: reqwest::Error) -> StorageError {
    if e.is_timeout() {
        StorageError::Timeout
    } else if e.is_connect() {
        StorageError::ConnectionFailed(e.to_string())
    } else {
        StorageError::Api(e.to_string())
    }
}

#[async_trait]
impl StorageGateway for HttpStorageGateway {
    async fn request_credentials(
        &self,
        project_id: i64,
        filename: &str,
        content_type: &str,
        file_size: u64,
    ) -> Result<UploadCredentials, StorageError> {
        let url = self
            .ctx
            .url(&format!("/api/assets/presigned-url?project_id={}", project_id));

        let body = PresignedUrlRequest {
            filename,
            content_type,
            file_size,
        };

        let request = self.ctx.http().post(&url).json(&body);
        let response = self
            .ctx
            .authorize(request)
            .send()
            .await
            .map_err(map_send_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Credential(format!("HTTP {}: {}", status, body)));
        }

        let parsed: PresignedUrlResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Credential(format!("Failed to parse response: {}", e)))?;

        debug!("Issued upload credentials for {}: {}", filename, parsed.storage_key);
        Ok(parsed.into_credentials())
    }

    async fn transfer(
        &self,
        credentials: &UploadCredentials,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StorageError> {
        let mut form = multipart::Form::new();
        for (name, value) in &credentials.extra_fields {
            form = form.text(name.clone(), value.clone());
        }

        let file_part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| StorageError::Transfer(e.to_string()))?;
        form = form.part("file", file_part);

        // Presigned endpoints carry their own authorization; no bearer here.
        let response = self
            .transfer_client
            .post(&credentials.transfer_endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::Transfer(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Transfer(format!("HTTP {}: {}", status, body)));
        }

        debug!("Transferred {} to {}", filename, credentials.storage_key);
        Ok(())
    }

    async fn confirm_upload(
        &self,
        project_id: i64,
        storage_key: &str,
        file_type: &str,
        original_filename: &str,
        file_size: u64,
    ) -> Result<AssetRecord, StorageError> {
        let url = self.ctx.url(&format!(
            "/api/assets/confirm-upload/{}?storage_key={}&file_type={}&original_filename={}&file_size={}",
            project_id,
            urlencoding::encode(storage_key),
            urlencoding::encode(file_type),
            urlencoding::encode(original_filename),
            file_size
        ));

        let request = self.ctx.http().post(&url);
        let response = self
            .ctx
            .authorize(request)
            .send()
            .await
            .map_err(map_send_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Confirmation(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| StorageError::Confirmation(format!("Failed to parse response: {}", e)))
    }

    async fn list_assets(&self, project_id: i64) -> Result<Vec<AssetRecord>, StorageError> {
        let url = self.ctx.url(&format!("/api/assets/project/{}", project_id));

        let request = self.ctx.http().get(&url);
        let response = self
            .ctx
            .authorize(request)
            .send()
            .await
            .map_err(map_send_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Api(format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| StorageError::Api(format!("Failed to parse response: {}", e)))
    }

    async fn delete_asset(&self, asset_id: i64) -> Result<(), StorageError> {
        let url = self.ctx.url(&format!("/api/assets/{}", asset_id));

        let request = self.ctx.http().delete(&url);
        let response = self
            .ctx
            .authorize(request)
            .send()
            .await
            .map_err(map_send_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Api(format!("HTTP {}", status)));
        }

        Ok(())
    }
}
