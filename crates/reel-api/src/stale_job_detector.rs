//! Recovery of jobs whose worker is gone.
//!
//! A job reports `processing` from submission until its worker records a
//! result. It can get stuck there in two ways:
//! - the API stopped while the job waited for a worker slot, so no worker
//!   ever started (the job has no heartbeat)
//! - the worker died while no API process was supervising it, so its
//!   heartbeat stopped advancing
//!
//! On startup the first kind is relaunched and the second is failed. While
//! the API runs, a periodic check keeps failing jobs whose heartbeat goes
//! stale.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reel_models::{JobId, JobStatus};
use reel_store::{JobStore, StoreError, StoreResult};
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::launcher::WorkerLauncher;
use crate::metrics;

/// Interval between stale job detection runs.
const DETECTION_INTERVAL: Duration = Duration::from_secs(30);

/// Message recorded for a job whose worker stopped reporting in.
pub const STALE_JOB_MESSAGE: &str = "worker stopped responding";

/// Outcome of one sweep over the task root.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Jobs handed to the launcher again because no worker ever started
    pub relaunched: u32,
    /// Jobs moved to `error` because their worker went silent
    pub failed: u32,
}

/// Stale job detector service.
pub struct StaleJobDetector {
    store: JobStore,
    launcher: Arc<dyn WorkerLauncher>,
    stale_after: Duration,
}

impl StaleJobDetector {
    pub fn new(store: JobStore, launcher: Arc<dyn WorkerLauncher>, stale_after: Duration) -> Self {
        Self {
            store,
            launcher,
            stale_after,
        }
    }

    /// Sweep left over from a previous API process.
    ///
    /// Must run before new submissions are accepted: any `processing` job
    /// without a heartbeat at that point was queued by a process that is
    /// gone.
    pub async fn recover_on_startup(&self) -> StoreResult<RecoveryReport> {
        self.sweep(true).await
    }

    /// Fail every `processing` job whose heartbeat is stale.
    pub async fn check_once(&self) -> StoreResult<RecoveryReport> {
        self.sweep(false).await
    }

    /// Start the background detection loop.
    ///
    /// This function runs indefinitely and should be spawned as a background task.
    pub async fn run(&self) {
        info!(
            "Starting stale job detector (interval: {:?}, stale after: {:?})",
            DETECTION_INTERVAL, self.stale_after
        );

        let mut ticker = interval(DETECTION_INTERVAL);
        loop {
            ticker.tick().await;

            match self.check_once().await {
                Ok(report) if report.failed > 0 => {
                    info!("Stale job detection complete: {} failed", report.failed);
                }
                Ok(_) => {}
                Err(e) => error!("Stale job detection error: {}", e),
            }
        }
    }

    async fn sweep(&self, relaunch_unstarted: bool) -> StoreResult<RecoveryReport> {
        let mut report = RecoveryReport::default();

        for job_id in self.store.list_jobs().await? {
            match self.store.get_status(&job_id).await {
                Ok(JobStatus::Processing) => {}
                Ok(_) => continue,
                Err(e) => {
                    // A directory without a marker never got past allocation
                    debug!(job_id = %job_id, "Skipping job without status: {}", e);
                    continue;
                }
            }

            match self.store.last_heartbeat(&job_id).await? {
                None if relaunch_unstarted => {
                    if self.relaunch(&job_id).await {
                        report.relaunched += 1;
                    } else {
                        report.failed += 1;
                    }
                }
                // Still waiting for a slot in this process
                None => {}
                Some(last) if self.is_stale(last) => {
                    warn!(job_id = %job_id, last_heartbeat = %last, "Detected stale job (no heartbeat)");
                    if self.fail(&job_id, STALE_JOB_MESSAGE).await {
                        report.failed += 1;
                    }
                }
                Some(_) => {}
            }
        }

        Ok(report)
    }

    fn is_stale(&self, last: DateTime<Utc>) -> bool {
        Utc::now()
            .signed_duration_since(last)
            .to_std()
            .map(|age| age > self.stale_after)
            .unwrap_or(false)
    }

    /// Hand a never-started job to the launcher again.
    ///
    /// Returns `false` when the job had to be failed instead.
    async fn relaunch(&self, job_id: &JobId) -> bool {
        let spec = match self.store.load_spec(job_id).await {
            Ok(spec) => spec,
            Err(e) => {
                warn!(job_id = %job_id, "Cannot relaunch job: {}", e);
                self.fail(job_id, &format!("job could not be resumed: {}", e))
                    .await;
                return false;
            }
        };

        match self.launcher.launch(&spec).await {
            Ok(()) => {
                info!(job_id = %job_id, "Relaunched job lost before its worker started");
                true
            }
            Err(e) => {
                error!(job_id = %job_id, "Failed to relaunch job: {}", e);
                self.fail(job_id, &format!("failed to launch worker: {}", e))
                    .await;
                false
            }
        }
    }

    /// Move a job to `error`, unless its worker got there first.
    async fn fail(&self, job_id: &JobId, message: &str) -> bool {
        match self.store.transition(job_id, &JobStatus::error(message)).await {
            Ok(()) => {}
            Err(StoreError::TerminalState { .. }) => return false,
            Err(e) => {
                error!(job_id = %job_id, "Failed to record stale job: {}", e);
                return false;
            }
        }

        // Only after the transition, so a worker finishing concurrently
        // cannot end up `done` without its artifact
        if let Err(e) = self.store.remove_artifact(job_id).await {
            warn!(job_id = %job_id, "Failed to remove partial artifact: {}", e);
        }
        metrics::record_job_failed();
        true
    }
}
