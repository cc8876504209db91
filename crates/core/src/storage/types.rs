//! Types for storage gateway operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during storage gateway operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend rejected credential issuance (quota, invalid type, ...).
    #[error("Credential issuance rejected: {0}")]
    Credential(String),

    /// The direct transfer to object storage failed. HTTP-level failures
    /// and transport failures are not distinguished at this layer.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// The backend rejected the upload confirmation.
    #[error("Confirmation rejected: {0}")]
    Confirmation(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("API error: {0}")]
    Api(String),
}

/// Server-issued, single-use descriptor authorizing one direct upload.
///
/// Must be fully consumed (transfer attempted) before being discarded and
/// never reused across files.
#[derive(Debug, Clone)]
pub struct UploadCredentials {
    /// Endpoint for the direct transfer.
    pub transfer_endpoint: String,
    /// Object key assigned by the backend.
    pub storage_key: String,
    /// Extra fields the storage service requires echoed back in the
    /// multipart body, always ahead of the file part.
    pub extra_fields: Vec<(String, String)>,
}

/// A confirmed asset record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: i64,
    pub project_id: i64,
    pub storage_key: String,
    /// "video" or "image".
    #[serde(rename = "type")]
    pub file_type: String,
    pub original_filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    /// Duration in seconds, video assets only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Trait for the storage gateway: credential issuance, direct transfer,
/// and confirmation, plus asset listing and deletion.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Request single-use upload credentials for one file.
    async fn request_credentials(
        &self,
        project_id: i64,
        filename: &str,
        content_type: &str,
        file_size: u64,
    ) -> Result<UploadCredentials, StorageError>;

    /// Perform the direct transfer to the credential's endpoint.
    ///
    /// Sends every extra field followed by the raw file as a multipart
    /// body. The credentials are consumed by this call.
    async fn transfer(
        &self,
        credentials: &UploadCredentials,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StorageError>;

    /// Confirm a completed transfer and create the asset record.
    async fn confirm_upload(
        &self,
        project_id: i64,
        storage_key: &str,
        file_type: &str,
        original_filename: &str,
        file_size: u64,
    ) -> Result<AssetRecord, StorageError>;

    /// List confirmed assets for a project.
    async fn list_assets(&self, project_id: i64) -> Result<Vec<AssetRecord>, StorageError>;

    /// Delete an asset.
    async fn delete_asset(&self, asset_id: i64) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::Credential("quota exceeded".to_string());
        assert_eq!(err.to_string(), "Credential issuance rejected: quota exceeded");

        let err = StorageError::Transfer("connection reset".to_string());
        assert_eq!(err.to_string(), "Transfer failed: connection reset");
    }

    #[test]
    fn test_asset_record_deserialization() {
        let json = r#"{
            "id": 7,
            "project_id": 3,
            "storage_key": "projects/3/assets/abc.mp4",
            "type": "video",
            "original_filename": "clip.mp4",
            "file_size": 1048576,
            "duration": 12.5,
            "width": 1920,
            "height": 1080,
            "analysis_metadata": null,
            "created_at": "2024-01-05T10:00:00Z"
        }"#;

        let asset: AssetRecord = serde_json::from_str(json).unwrap();
        assert_eq!(asset.id, 7);
        assert_eq!(asset.file_type, "video");
        assert_eq!(asset.original_filename, "clip.mp4");
        assert_eq!(asset.duration, Some(12.5));
    }

    #[test]
    fn test_asset_record_minimal_deserialization() {
        let json = r#"{
            "id": 1,
            "project_id": 1,
            "storage_key": "projects/1/assets/a.jpg",
            "type": "image",
            "original_filename": "a.jpg"
        }"#;

        let asset: AssetRecord = serde_json::from_str(json).unwrap();
        assert!(asset.file_size.is_none());
        assert!(asset.duration.is_none());
        assert!(asset.created_at.is_none());
    }
}
