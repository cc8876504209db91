use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer credential attached to every backend call. The surrounding
    /// layer owns its lifecycle; the client only reads it.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u32 {
    60
}

/// Upload pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Timeout for the direct storage transfer. Media files are large,
    /// so this is much longer than the API timeout.
    #[serde(default = "default_transfer_timeout_secs")]
    pub transfer_timeout_secs: u32,
    /// Advisory size ceiling in bytes; the backend enforces the real limit.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            transfer_timeout_secs: default_transfer_timeout_secs(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_transfer_timeout_secs() -> u32 {
    300
}

fn default_max_file_size() -> u64 {
    500 * 1024 * 1024
}

/// Job polling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobsConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    2000
}
