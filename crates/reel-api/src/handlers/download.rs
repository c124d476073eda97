//! Artifact download.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use crate::coordinator::CoordinatorError;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const VIDEO_CONTENT_TYPE: &str = "video/mp4";
const ATTACHMENT_DISPOSITION: &str = "attachment; filename=\"output.mp4\"";

/// GET /download/:task_id
///
/// Streams the rendered video. Unknown jobs and jobs without an artifact
/// both answer 404 `{"status": "error", "message": "File not found"}`.
pub async fn download_file(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Response> {
    let path = state
        .coordinator
        .artifact(&task_id)
        .await
        .map_err(|e| match e {
            CoordinatorError::NotFound(_) => ApiError::FileNotFound,
            other => ApiError::from(other),
        })?;

    // The artifact may vanish between the existence check and the open
    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ApiError::FileNotFound),
        Err(e) => {
            warn!(task_id = %task_id, "Failed to open artifact: {}", e);
            return Err(ApiError::internal(format!("Failed to open artifact: {}", e)));
        }
    };
    let length = file.metadata().await.ok().map(|m| m.len());

    info!(task_id = %task_id, bytes = ?length, "Serving artifact");

    let mut response = (StatusCode::OK, Body::from_stream(ReaderStream::new(file))).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(VIDEO_CONTENT_TYPE));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static(ATTACHMENT_DISPOSITION),
    );
    if let Some(length) = length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok(response)
}
