//! Filesystem-backed job store.
//!
//! This crate provides:
//! - One directory per job under a task root
//! - Atomic status-marker writes (temp file + rename)
//! - Monotonic status transitions shared by every writer process
//! - Deterministic artifact paths
//! - Worker heartbeats for detecting lost or stalled jobs

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{JobStore, ARTIFACT_FILE, HEARTBEAT_FILE, SPEC_FILE, STATUS_FILE};
