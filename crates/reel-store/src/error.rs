//! Store error types.

use std::path::PathBuf;

use reel_models::JobStatus;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to allocate job directory {path}: {source}")]
    AllocationError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job {job_id} is already {status}")]
    TerminalState { job_id: String, status: JobStatus },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(job_id: impl Into<String>) -> Self {
        Self::NotFound(job_id.into())
    }

    pub fn allocation(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::AllocationError {
            path: path.into(),
            source,
        }
    }

    /// Check if this error means the job does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
