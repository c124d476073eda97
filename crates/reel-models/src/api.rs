//! HTTP request and response bodies.

use serde::{Deserialize, Serialize};

/// `POST /start` body.
///
/// Fields are optional so that a missing field is reported as a 400 with
/// the service's own message instead of a deserializer error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub on_video_title: Option<String>,
}

/// `POST /start` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    pub task_id: String,
    /// Always `"started"`
    pub status: String,
}

impl StartResponse {
    pub fn started(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: "started".to_string(),
        }
    }
}

/// `POST /status` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub task_id: Option<String>,
}

/// `POST /status` success body, one shape per job status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusResponse {
    Processing { task_id: String },
    Done { task_id: String, download_url: String },
    Error { message: String },
}

/// Error body used by `/start` and `/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error body used by `/download/{task_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadErrorResponse {
    /// Always `"error"`
    pub status: String,
    pub message: String,
}

impl DownloadErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}
