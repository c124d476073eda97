//! Render worker.
//!
//! One worker process runs exactly one job:
//! - Load the job spec from the job store
//! - Mark the job `processing`
//! - Invoke the render capability, refreshing the job heartbeat meanwhile
//! - Record `done` or `error: <message>`
//!
//! Render failures become job state. They are never returned as errors.

pub mod error;
pub mod job;
pub mod logging;

pub use error::{WorkerError, WorkerResult};
pub use job::{execute_job, HEARTBEAT_INTERVAL};
pub use logging::JobLogger;
