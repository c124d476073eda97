//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reel_models::{DownloadErrorResponse, ErrorResponse};
use thiserror::Error;

use crate::coordinator::CoordinatorError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Download requested before the artifact exists.
    #[error("File not found")]
    FileNotFound,

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::FileNotFound => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(e: CoordinatorError) -> Self {
        match e {
            CoordinatorError::InvalidRequest => ApiError::bad_request(e.to_string()),
            CoordinatorError::NotFound(_) => ApiError::not_found("Invalid task_id"),
            other => ApiError::internal(other.to_string()),
        }
    }
}

/// Body that replaces internal error details in production.
pub const REDACTED_INTERNAL_ERROR: &str = "An internal error occurred";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ApiError::FileNotFound = self {
            return (status, Json(DownloadErrorResponse::new(self.to_string()))).into_response();
        }

        let error = self.to_string();
        (status, Json(ErrorResponse { error })).into_response()
    }
}
