//! Error types for render operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering.
///
/// The `Display` text is what ends up in a job's `error:` status marker,
/// so it must read well on its own.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Render program not found: {0}")]
    ProgramNotFound(String),

    #[error("{message}")]
    Failed {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("Render timed out after {0} seconds")]
    Timeout(u64),

    #[error("Render finished but produced no output at {0}")]
    MissingOutput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Create a render failure error.
    pub fn failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::Failed {
            message: message.into(),
            exit_code,
        }
    }
}
