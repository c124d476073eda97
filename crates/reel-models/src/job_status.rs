//! Job status state machine and its status-marker encoding.
//!
//! A job is `processing` until its worker finishes, then `done` or
//! `error: <message>` forever. The marker is the plain text stored in
//! the job's `status.txt`.

use serde::{Deserialize, Serialize};

const MARKER_PROCESSING: &str = "processing";
const MARKER_DONE: &str = "done";
const MARKER_ERROR: &str = "error";

/// Job processing status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum JobStatus {
    /// Worker has not finished yet
    #[default]
    Processing,
    /// Artifact has been written
    Done,
    /// Render failed; carries the failure message
    Error(String),
}

impl JobStatus {
    /// Create an error status.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Get the status name without any message.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => MARKER_PROCESSING,
            JobStatus::Done => MARKER_DONE,
            JobStatus::Error(_) => MARKER_ERROR,
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error(_))
    }

    /// Encode as the text stored in the status marker file.
    pub fn to_marker(&self) -> String {
        match self {
            JobStatus::Error(message) => format!("{}: {}", MARKER_ERROR, message),
            other => other.as_str().to_string(),
        }
    }

    /// Decode a status marker.
    ///
    /// Unrecognised content (including an empty file) reads as `processing`,
    /// which is the only non-terminal state.
    pub fn from_marker(marker: &str) -> Self {
        let marker = marker.trim();
        if marker == MARKER_DONE {
            return JobStatus::Done;
        }
        if let Some(rest) = marker.strip_prefix(MARKER_ERROR) {
            let message = rest.strip_prefix(':').unwrap_or(rest).trim_start();
            return JobStatus::Error(message.to_string());
        }
        JobStatus::Processing
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_marker())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_encoding() {
        assert_eq!(JobStatus::Processing.to_marker(), "processing");
        assert_eq!(JobStatus::Done.to_marker(), "done");
        assert_eq!(
            JobStatus::error("folder has no audio").to_marker(),
            "error: folder has no audio"
        );
    }

    #[test]
    fn test_marker_decoding() {
        assert_eq!(JobStatus::from_marker("processing"), JobStatus::Processing);
        assert_eq!(JobStatus::from_marker("done\n"), JobStatus::Done);
        assert_eq!(
            JobStatus::from_marker("error: HttpError 404 when requesting folder"),
            JobStatus::error("HttpError 404 when requesting folder")
        );
        // A message may itself contain colons
        assert_eq!(
            JobStatus::from_marker("error: a: b"),
            JobStatus::error("a: b")
        );
        assert_eq!(JobStatus::from_marker("error"), JobStatus::error(""));
    }

    #[test]
    fn test_unknown_marker_is_processing() {
        assert_eq!(JobStatus::from_marker(""), JobStatus::Processing);
        assert_eq!(JobStatus::from_marker("started"), JobStatus::Processing);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::error("boom").is_terminal());
    }
}
