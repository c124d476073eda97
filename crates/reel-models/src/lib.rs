//! Shared data models for the reel render service.
//!
//! This crate provides Serde-serializable types for:
//! - Job identifiers and job specs
//! - The job status state machine and its on-disk marker encoding
//! - Request/response bodies of the HTTP API

pub mod api;
pub mod job;
pub mod job_status;

// Re-export common types
pub use api::{
    DownloadErrorResponse, ErrorResponse, StartRequest, StartResponse, StatusRequest,
    StatusResponse,
};
pub use job::{JobId, JobSpec};
pub use job_status::JobStatus;
