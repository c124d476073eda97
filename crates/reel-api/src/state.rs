//! Application state.

use std::sync::Arc;

use reel_store::JobStore;
use tracing::info;

use crate::config::{ApiConfig, CoordinatorConfig};
use crate::coordinator::JobCoordinator;
use crate::launcher::{ProcessLauncher, WorkerLauncher};
use crate::stale_job_detector::StaleJobDetector;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub coordinator: Arc<JobCoordinator>,
    /// Present when jobs run in worker processes
    pub stale_detector: Option<Arc<StaleJobDetector>>,
}

impl AppState {
    /// Create application state with a process-per-job launcher.
    ///
    /// Jobs left unfinished by a previous run are recovered before this
    /// returns.
    pub async fn new(
        config: ApiConfig,
        coordinator_config: CoordinatorConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let store = JobStore::new(&coordinator_config.task_root);
        store.init().await?;

        let launcher: Arc<dyn WorkerLauncher> =
            Arc::new(ProcessLauncher::new(&coordinator_config, store.clone())?);

        let detector = StaleJobDetector::new(
            store.clone(),
            Arc::clone(&launcher),
            coordinator_config.stale_after,
        );
        let report = detector.recover_on_startup().await?;
        info!(
            "Recovered unfinished jobs: {} relaunched, {} failed",
            report.relaunched, report.failed
        );

        let coordinator = JobCoordinator::new(store, launcher);
        let mut state = Self::with_coordinator(config, coordinator);
        state.stale_detector = Some(Arc::new(detector));
        Ok(state)
    }

    /// Create application state around an existing coordinator.
    pub fn with_coordinator(config: ApiConfig, coordinator: JobCoordinator) -> Self {
        Self {
            config,
            coordinator: Arc::new(coordinator),
            stale_detector: None,
        }
    }
}
