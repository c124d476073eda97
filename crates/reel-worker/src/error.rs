//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Failures that prevent the worker from recording a job outcome.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid job id: {0}")]
    InvalidJobId(String),

    #[error("Store error: {0}")]
    Store(#[from] reel_store::StoreError),
}

impl WorkerError {
    pub fn invalid_job_id(id: impl Into<String>) -> Self {
        Self::InvalidJobId(id.into())
    }
}
