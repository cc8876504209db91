pub mod config;
pub mod context;
pub mod jobs;
pub mod storage;
pub mod testing;
pub mod tracker;
pub mod uploader;

pub use config::{
    load_config, load_config_from_str, validate_config, ApiConfig, Config, ConfigError,
    JobsConfig, UploadConfig,
};
pub use context::ApiContext;
pub use jobs::{HttpJobGateway, Job, JobError, JobGateway, JobResult, JobStatus};
pub use storage::{
    AssetRecord, HttpStorageGateway, StorageError, StorageGateway, UploadCredentials,
};
pub use tracker::{JobTracker, PollHandle, TrackerSnapshot, DEFAULT_POLL_INTERVAL};
pub use uploader::{
    BatchObserver, BatchOutcome, LocalFile, MediaKind, NoopObserver, TaskState, UploadOrchestrator,
    UploadTask,
};
