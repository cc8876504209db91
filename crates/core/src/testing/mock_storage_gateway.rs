//! Mock storage gateway for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::storage::{AssetRecord, StorageError, StorageGateway, UploadCredentials};

/// Mock implementation of the StorageGateway trait.
///
/// Provides controllable behavior for testing:
/// - Record every call in arrival order for sequencing assertions
/// - Track how many credential requests were in flight simultaneously
/// - Fail a chosen step for a chosen filename
#[derive(Default)]
struct Failures {
    credentials: HashMap<String, String>,
    transfer: HashMap<String, String>,
    confirm: HashMap<String, String>,
}

pub struct MockStorageGateway {
    calls: Arc<RwLock<Vec<String>>>,
    failures: Arc<RwLock<Failures>>,
    inflight_credentials: Arc<RwLock<usize>>,
    max_inflight_credentials: Arc<RwLock<usize>>,
    asset_counter: Arc<RwLock<i64>>,
    assets: Arc<RwLock<Vec<AssetRecord>>>,
}

impl Default for MockStorageGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorageGateway {
    /// Create a new mock storage gateway.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(Failures::default())),
            inflight_credentials: Arc::new(RwLock::new(0)),
            max_inflight_credentials: Arc::new(RwLock::new(0)),
            asset_counter: Arc::new(RwLock::new(0)),
            assets: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Make credential issuance fail for a filename.
    pub async fn fail_credentials_for(&self, filename: &str, reason: &str) {
        self.failures
            .write()
            .await
            .credentials
            .insert(filename.to_string(), reason.to_string());
    }

    /// Make the direct transfer fail for a filename.
    pub async fn fail_transfer_for(&self, filename: &str, reason: &str) {
        self.failures
            .write()
            .await
            .transfer
            .insert(filename.to_string(), reason.to_string());
    }

    /// Make confirmation fail for a filename.
    pub async fn fail_confirm_for(&self, filename: &str, reason: &str) {
        self.failures
            .write()
            .await
            .confirm
            .insert(filename.to_string(), reason.to_string());
    }

    /// All recorded calls, in arrival order, as `step:filename`.
    pub async fn recorded_calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    /// Highest number of credential requests ever in flight together.
    pub async fn max_inflight_credentials(&self) -> usize {
        *self.max_inflight_credentials.read().await
    }

    pub async fn credential_count(&self) -> usize {
        self.count_step("credentials").await
    }

    pub async fn transfer_count(&self) -> usize {
        self.count_step("transfer").await
    }

    pub async fn confirm_count(&self) -> usize {
        self.count_step("confirm").await
    }

    async fn count_step(&self, step: &str) -> usize {
        let prefix = format!("{}:", step);
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    async fn record(&self, step: &str, filename: &str) {
        self.calls
            .write()
            .await
            .push(format!("{}:{}", step, filename));
    }
}

#[async_trait]
impl StorageGateway for MockStorageGateway {
    async fn request_credentials(
        &self,
        project_id: i64,
        filename: &str,
        _content_type: &str,
        _file_size: u64,
    ) -> Result<UploadCredentials, StorageError> {
        self.record("credentials", filename).await;

        {
            let mut inflight = self.inflight_credentials.write().await;
            *inflight += 1;
            let mut max = self.max_inflight_credentials.write().await;
            if *inflight > *max {
                *max = *inflight;
            }
        }

        // Give a concurrent caller a chance to overlap, so the sequential
        // invariant is actually exercised.
        tokio::task::yield_now().await;

        {
            let mut inflight = self.inflight_credentials.write().await;
            *inflight -= 1;
        }

        if let Some(reason) = self.failures.read().await.credentials.get(filename) {
            return Err(StorageError::Credential(reason.clone()));
        }

        Ok(UploadCredentials {
            transfer_endpoint: "https://storage.mock/upload".to_string(),
            storage_key: format!("projects/{}/assets/{}", project_id, filename),
            extra_fields: vec![("policy".to_string(), "mock-policy".to_string())],
        })
    }

    async fn transfer(
        &self,
        _credentials: &UploadCredentials,
        filename: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<(), StorageError> {
        self.record("transfer", filename).await;

        if let Some(reason) = self.failures.read().await.transfer.get(filename) {
            return Err(StorageError::Transfer(reason.clone()));
        }

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
        self.record("confirm", original_filename).await;

        if let Some(reason) = self.failures.read().await.confirm.get(original_filename) {
            return Err(StorageError::Confirmation(reason.clone()));
        }

        let id = {
            let mut counter = self.asset_counter.write().await;
            *counter += 1;
            *counter
        };

        let asset = AssetRecord {
            id,
            project_id,
            storage_key: storage_key.to_string(),
            file_type: file_type.to_string(),
            original_filename: original_filename.to_string(),
            file_size: Some(file_size as i64),
            duration: None,
            width: None,
            height: None,
            created_at: Some(Utc::now()),
        };
        self.assets.write().await.push(asset.clone());
        Ok(asset)
    }

    async fn list_assets(&self, project_id: i64) -> Result<Vec<AssetRecord>, StorageError> {
        Ok(self
            .assets
            .read()
            .await
            .iter()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn delete_asset(&self, asset_id: i64) -> Result<(), StorageError> {
        let mut assets = self.assets.write().await;
        let before = assets.len();
        assets.retain(|a| a.id != asset_id);
        if assets.len() == before {
            return Err(StorageError::Api(format!("asset {} not found", asset_id)));
        }
        Ok(())
    }
}
