//! Axum HTTP job service.
//!
//! This crate provides:
//! - `POST /start`, `POST /status`, `GET /download/:task_id`
//! - The job coordinator (submit, query, artifact lookup)
//! - Worker launching, one isolated process per job
//! - Recovery of jobs whose worker was lost or went silent
//! - Rate limiting, security headers, and Prometheus metrics

pub mod config;
pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod launcher;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod stale_job_detector;
pub mod state;

pub use config::{ApiConfig, CoordinatorConfig};
pub use coordinator::{CoordinatorError, CoordinatorResult, JobCoordinator};
pub use error::{ApiError, ApiResult};
pub use launcher::{LaunchError, LaunchResult, ProcessLauncher, WorkerLauncher};
pub use routes::create_router;
pub use stale_job_detector::{RecoveryReport, StaleJobDetector};
pub use state::AppState;
