//! Job submission and status polling.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use tracing::{debug, info};

use reel_models::{JobId, JobStatus, StartRequest, StartResponse, StatusRequest, StatusResponse};

use crate::config::ApiConfig;
use crate::coordinator::CoordinatorError;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /start
///
/// Body: `{"folder_id": "...", "on_video_title": "..."}`
///
/// Returns:
/// - 200: `{"task_id": "...", "status": "started"}`
/// - 400: either field missing or empty
pub async fn start_task(
    State(state): State<AppState>,
    body: Result<Json<StartRequest>, JsonRejection>,
) -> ApiResult<Json<StartResponse>> {
    let Json(request) = body.map_err(|_| ApiError::from(CoordinatorError::InvalidRequest))?;

    let folder_id = request.folder_id.unwrap_or_default();
    let title = request.on_video_title.unwrap_or_default();

    let job_id = state.coordinator.submit(&folder_id, &title).await?;
    info!(job_id = %job_id, "start_task accepted");

    Ok(Json(StartResponse::started(job_id.as_str())))
}

/// POST /status
///
/// Body: `{"task_id": "..."}`
///
/// Returns:
/// - 200: processing, done (with `download_url`), or error (with `message`)
/// - 400: `task_id` missing
/// - 404: unknown `task_id`
pub async fn check_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let task_id = body
        .ok()
        .and_then(|Json(request)| request.task_id)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing 'task_id'"))?;

    let (job_id, status) = state.coordinator.query(&task_id).await?;
    debug!(job_id = %job_id, status = status.as_str(), "check_status");

    let response = match status {
        JobStatus::Done => StatusResponse::Done {
            download_url: download_url(&state.config, &headers, &job_id),
            task_id: job_id.to_string(),
        },
        JobStatus::Error(message) => StatusResponse::Error { message },
        JobStatus::Processing => StatusResponse::Processing {
            task_id: job_id.to_string(),
        },
    };

    Ok(Json(response))
}

/// Absolute URL of the download endpoint for `job_id`.
///
/// Uses `PUBLIC_BASE_URL` when configured, else the request's Host header.
pub fn download_url(config: &ApiConfig, headers: &HeaderMap, job_id: &JobId) -> String {
    let path = format!("/download/{}", job_id);

    if let Some(base) = &config.public_base_url {
        return format!("{}{}", base, path);
    }

    match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{}{}", host, path),
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_download_url_from_host_header() {
        let config = ApiConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("render.local:8000"));
        let id = JobId::new();

        assert_eq!(
            download_url(&config, &headers, &id),
            format!("http://render.local:8000/download/{}", id)
        );
    }

    #[test]
    fn test_download_url_prefers_public_base() {
        let config = ApiConfig {
            public_base_url: Some("https://reels.example.com".into()),
            ..ApiConfig::default()
        };
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("10.0.0.5:8000"));
        let id = JobId::new();

        assert_eq!(
            download_url(&config, &headers, &id),
            format!("https://reels.example.com/download/{}", id)
        );
    }

    #[test]
    fn test_download_url_without_host() {
        let id = JobId::new();
        assert_eq!(
            download_url(&ApiConfig::default(), &HeaderMap::new(), &id),
            format!("/download/{}", id)
        );
    }
}
