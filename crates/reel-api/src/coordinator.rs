//! Job coordinator: submission, status queries, and artifact lookup.

use std::path::PathBuf;
use std::sync::Arc;

use reel_models::{JobId, JobSpec, JobStatus};
use reel_store::{JobStore, StoreError};
use thiserror::Error;
use tracing::{error, info};

use crate::launcher::{LaunchError, WorkerLauncher};
use crate::metrics;

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Missing 'folder_id' or 'on_video_title'")]
    InvalidRequest,

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Failed to allocate job storage: {0}")]
    Allocation(String),

    #[error("Failed to launch worker: {0}")]
    Launch(#[from] LaunchError),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CoordinatorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => CoordinatorError::NotFound(id),
            e @ StoreError::AllocationError { .. } => CoordinatorError::Allocation(e.to_string()),
            other => CoordinatorError::Store(other),
        }
    }
}

/// Creates jobs, hands them to workers, and answers queries from the store.
pub struct JobCoordinator {
    store: JobStore,
    launcher: Arc<dyn WorkerLauncher>,
}

impl JobCoordinator {
    pub fn new(store: JobStore, launcher: Arc<dyn WorkerLauncher>) -> Self {
        Self { store, launcher }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Accept a render request and start it out-of-band.
    ///
    /// Returns as soon as the job directory exists and a worker has been
    /// scheduled; the job reports `processing` from this point on.
    pub async fn submit(&self, folder_id: &str, title: &str) -> CoordinatorResult<JobId> {
        if folder_id.trim().is_empty() || title.trim().is_empty() {
            return Err(CoordinatorError::InvalidRequest);
        }

        let spec = JobSpec::new(folder_id, title);
        self.store.create(&spec).await?;

        if let Err(e) = self.launcher.launch(&spec).await {
            error!(job_id = %spec.id, "Failed to launch worker: {}", e);
            let status = JobStatus::error(format!("failed to launch worker: {}", e));
            if let Err(store_err) = self.store.transition(&spec.id, &status).await {
                error!(job_id = %spec.id, "Failed to record launch failure: {}", store_err);
            }
            return Err(e.into());
        }

        metrics::record_job_submitted();
        info!(job_id = %spec.id, folder_id = %spec.folder_id, "Job submitted");
        Ok(spec.id)
    }

    /// Current status of a job.
    pub async fn query(&self, task_id: &str) -> CoordinatorResult<(JobId, JobStatus)> {
        let job_id = parse_task_id(task_id)?;
        let status = self.store.get_status(&job_id).await?;
        Ok((job_id, status))
    }

    /// Path of the finished artifact.
    ///
    /// `NotFound` covers unknown jobs, jobs still rendering (whose output
    /// file may be partially written) and failed jobs.
    pub async fn artifact(&self, task_id: &str) -> CoordinatorResult<PathBuf> {
        let job_id = parse_task_id(task_id)?;
        let status = self.store.get_status(&job_id).await?;
        if status == JobStatus::Done && self.store.artifact_exists(&job_id).await {
            Ok(self.store.artifact_path(&job_id))
        } else {
            Err(CoordinatorError::NotFound(task_id.to_string()))
        }
    }
}

fn parse_task_id(task_id: &str) -> CoordinatorResult<JobId> {
    JobId::parse(task_id).ok_or_else(|| CoordinatorError::NotFound(task_id.to_string()))
}
