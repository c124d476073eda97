//! Worker launching.
//!
//! Every job runs in its own `reel-worker` process. The API never shares
//! memory with a worker; the job store is the only channel between them.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use reel_models::{JobId, JobSpec, JobStatus};
use reel_store::JobStore;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::CoordinatorConfig;
use crate::metrics;

pub type LaunchResult<T> = Result<T, LaunchError>;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Worker binary not found: {0}")]
    BinaryNotFound(PathBuf),

    #[error("Failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Starts the out-of-band execution of a job.
///
/// `launch` must return without waiting for the render to finish.
#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    async fn launch(&self, job: &JobSpec) -> LaunchResult<()>;
}

/// Spawns one `reel-worker` child process per job.
///
/// At most `max_concurrent_workers` children run at once; further jobs wait
/// for a slot while already reporting `processing`.
pub struct ProcessLauncher {
    program: PathBuf,
    leading_args: Vec<String>,
    store: JobStore,
    slots: Option<Arc<Semaphore>>,
}

impl ProcessLauncher {
    /// Create a launcher for workers operating on `store`.
    pub fn new(config: &CoordinatorConfig, store: JobStore) -> LaunchResult<Self> {
        let program = which::which(&config.worker_binary)
            .map_err(|_| LaunchError::BinaryNotFound(config.worker_binary.clone()))?;

        let slots = match config.max_concurrent_workers {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        info!(
            "Worker launcher ready: {} (max concurrent: {})",
            program.display(),
            config.max_concurrent_workers
        );

        Ok(Self {
            program,
            leading_args: config.worker_args.clone(),
            store,
            slots,
        })
    }
}

#[async_trait]
impl WorkerLauncher for ProcessLauncher {
    async fn launch(&self, job: &JobSpec) -> LaunchResult<()> {
        let supervisor = WorkerSupervisor {
            program: self.program.clone(),
            leading_args: self.leading_args.clone(),
            store: self.store.clone(),
            job_id: job.id.clone(),
        };
        let slots = self.slots.clone();

        tokio::spawn(async move {
            let _permit = match slots {
                Some(slots) => match slots.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        error!(job_id = %supervisor.job_id, "Worker slots closed, job not started");
                        supervisor.fail_if_unfinished("worker pool shut down").await;
                        return;
                    }
                },
                None => None,
            };
            supervisor.run().await;
        });

        Ok(())
    }
}

/// Owns one worker child from spawn to exit.
struct WorkerSupervisor {
    program: PathBuf,
    leading_args: Vec<String>,
    store: JobStore,
    job_id: JobId,
}

impl WorkerSupervisor {
    async fn run(&self) {
        metrics::worker_started();

        let spawned = Command::new(&self.program)
            .args(&self.leading_args)
            .arg("--task-root")
            .arg(self.store.root())
            .arg("--job-id")
            .arg(self.job_id.as_str())
            .stdin(Stdio::null())
            .spawn();

        let exit = match spawned {
            Ok(mut child) => {
                info!(job_id = %self.job_id, pid = ?child.id(), "Worker started");
                // Marks the job as owned by a live process from now on
                if let Err(e) = self.store.record_heartbeat(&self.job_id).await {
                    warn!(job_id = %self.job_id, "Failed to record heartbeat: {}", e);
                }
                child.wait().await
            }
            Err(e) => Err(e),
        };

        metrics::worker_finished();

        match exit {
            Ok(status) if status.success() => {
                self.fail_if_unfinished("worker exited without recording a result")
                    .await;
            }
            Ok(status) => {
                warn!(job_id = %self.job_id, "Worker exited with {}", status);
                self.fail_if_unfinished(&format!("worker exited unexpectedly ({})", status))
                    .await;
            }
            Err(e) => {
                error!(job_id = %self.job_id, "Failed to run worker: {}", e);
                self.fail_if_unfinished(&format!("failed to start worker: {}", e))
                    .await;
            }
        }

        match self.store.get_status(&self.job_id).await {
            Ok(JobStatus::Done) => metrics::record_job_completed(),
            Ok(JobStatus::Error(_)) => metrics::record_job_failed(),
            Ok(JobStatus::Processing) => {}
            Err(e) => warn!(job_id = %self.job_id, "Failed to read final status: {}", e),
        }
    }

    /// Record a terminal error unless the worker already reached one.
    async fn fail_if_unfinished(&self, message: &str) {
        match self.store.get_status(&self.job_id).await {
            Ok(status) if status.is_terminal() => {}
            Ok(_) => {
                if let Err(e) = self.store.remove_artifact(&self.job_id).await {
                    warn!(job_id = %self.job_id, "Failed to remove partial artifact: {}", e);
                }
                if let Err(e) = self
                    .store
                    .transition(&self.job_id, &JobStatus::error(message))
                    .await
                {
                    error!(job_id = %self.job_id, "Failed to record worker failure: {}", e);
                }
            }
            Err(e) => error!(job_id = %self.job_id, "Failed to read status: {}", e),
        }
    }
}
