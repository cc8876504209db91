//! Cutroom CLI entry point.
//!
//! Command-line client for the Cutroom backend: upload media into a
//! project, manage its assets, start AI edit jobs, and watch them run.
//! Configuration comes from CUTROOM_CONFIG (falling back to ./config.toml
//! when present) with CUTROOM_* environment overrides.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use cutroom_cli::{content_type_for, init_tracing};
use cutroom_core::{
    load_config, validate_config, ApiContext, BatchObserver, Config, HttpJobGateway,
    HttpStorageGateway, Job, JobStatus, JobTracker, LocalFile, StorageGateway, TaskState,
    UploadOrchestrator, UploadTask,
};

#[derive(Parser)]
#[command(name = "cutroom", about = "Cutroom media editing CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload media files into a project
    Upload {
        /// Project id
        project_id: i64,
        /// Paths of the files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List a project's confirmed assets
    Assets {
        /// Project id
        project_id: i64,
    },
    /// Delete an asset by id
    DeleteAsset {
        /// Asset id
        asset_id: i64,
    },
    /// Start an AI edit job for a project
    StartEdit {
        /// Project id
        project_id: i64,
        /// Keep polling until the job reaches a terminal status
        #[arg(long)]
        watch: bool,
    },
    /// Show the most recent edit job for a project
    Latest {
        /// Project id
        project_id: i64,
    },
    /// Watch the most recent edit job until it settles
    Watch {
        /// Project id
        project_id: i64,
    },
}

/// Observer that reports each settled upload on stderr as it happens.
struct ProgressReporter;

#[async_trait]
impl BatchObserver for ProgressReporter {
    async fn task_settled(&self, _index: usize, task: &UploadTask) {
        match task.state {
            TaskState::Complete => {
                let asset_id = task.asset.as_ref().map(|a| a.id).unwrap_or_default();
                eprintln!("uploaded {} (asset {})", task.file_name, asset_id);
            }
            _ => {
                let reason = task.error.as_deref().unwrap_or("unknown error");
                eprintln!("failed {}: {}", task.file_name, reason);
            }
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize response")?;
    println!("{}", out);
    Ok(())
}

fn load_cli_config() -> Result<Config> {
    let config = match std::env::var("CUTROOM_CONFIG") {
        Ok(path) => {
            let path = PathBuf::from(path);
            load_config(&path)
                .with_context(|| format!("Failed to load config from {:?}", path))?
        }
        Err(_) => {
            let default_path = Path::new("config.toml");
            if default_path.exists() {
                load_config(default_path).context("Failed to load config.toml")?
            } else {
                Config::default()
            }
        }
    };

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn read_local_file(path: &Path, max_file_size: u64) -> Result<LocalFile> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid file name: {:?}", path))?
        .to_string();

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;

    if bytes.len() as u64 > max_file_size {
        bail!(
            "{} is {} bytes, over the configured limit of {}",
            name,
            bytes.len(),
            max_file_size
        );
    }

    let content_type = content_type_for(&name);
    Ok(LocalFile::new(name, content_type, bytes))
}

async fn watch_job(tracker: &JobTracker, job: Job, interval: Duration) -> Result<()> {
    eprintln!(
        "watching job {} ({}, {:.0}%)",
        job.id,
        job.status.as_str(),
        job.progress
    );
    let handle = tracker.poll_job_status(job.id, interval);
    let mut last_reported = (job.status, job.progress as i64);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                eprintln!("stopped watching; the job keeps running on the backend");
                return Ok(());
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {
                let snapshot = tracker.snapshot().await;
                if let Some(job) = &snapshot.job {
                    let current = (job.status, job.progress as i64);
                    if current != last_reported {
                        eprintln!("job {}: {} {:.0}%", job.id, job.status.as_str(), job.progress);
                        last_reported = current;
                    }
                }
                if handle.is_finished() {
                    break;
                }
            }
        }
    }

    let snapshot = tracker.snapshot().await;
    let job = snapshot
        .job
        .context("Polling stopped without a job snapshot")?;
    print_json(&job)?;

    if job.status == JobStatus::Failed {
        bail!(
            "edit job {} failed: {}",
            job.id,
            job.error.as_deref().unwrap_or("no error reported")
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_cli_config()?;

    let ctx = ApiContext::new(&config.api);
    let storage: Arc<dyn StorageGateway> =
        Arc::new(HttpStorageGateway::new(ctx.clone(), &config.upload));
    let jobs = Arc::new(HttpJobGateway::new(ctx));
    let poll_interval = Duration::from_millis(config.jobs.poll_interval_ms);

    match cli.command {
        Commands::Upload { project_id, files } => {
            let mut batch = Vec::with_capacity(files.len());
            for path in &files {
                batch.push(read_local_file(path, config.upload.max_file_size).await?);
            }

            info!("Uploading {} file(s) to project {}", batch.len(), project_id);
            let orchestrator = UploadOrchestrator::new(storage);
            let outcome = orchestrator
                .submit_batch(project_id, batch, &ProgressReporter)
                .await;

            print_json(&outcome)?;
            if !outcome.all_complete() {
                bail!(
                    "{} of {} upload(s) failed",
                    outcome.failed_count(),
                    outcome.tasks.len()
                );
            }
        }
        Commands::Assets { project_id } => {
            let assets = storage.list_assets(project_id).await?;
            print_json(&assets)?;
        }
        Commands::DeleteAsset { asset_id } => {
            storage.delete_asset(asset_id).await?;
            print_json(&serde_json::json!({ "deleted": asset_id }))?;
        }
        Commands::StartEdit { project_id, watch } => {
            let tracker = JobTracker::new(jobs);
            let job = tracker.start_edit(project_id).await?;
            if watch {
                watch_job(&tracker, job, poll_interval).await?;
            } else {
                print_json(&job)?;
            }
        }
        Commands::Latest { project_id } => {
            let tracker = JobTracker::new(jobs);
            match tracker.fetch_latest(project_id).await? {
                Some(job) => print_json(&job)?,
                None => print_json(&serde_json::json!({ "job": null }))?,
            }
        }
        Commands::Watch { project_id } => {
            let tracker = JobTracker::new(jobs);
            let job = tracker
                .fetch_latest(project_id)
                .await?
                .with_context(|| format!("Project {} has no edit job to watch", project_id))?;
            if job.status.is_terminal() {
                print_json(&job)?;
            } else {
                watch_job(&tracker, job, poll_interval).await?;
            }
        }
    }

    Ok(())
}
