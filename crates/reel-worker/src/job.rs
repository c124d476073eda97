//! Single-job execution.

use std::time::{Duration, Instant};

use reel_models::{JobId, JobStatus};
use reel_render::{RenderCapability, RenderRequest};
use reel_store::JobStore;
use tracing::{warn, Instrument};

use crate::error::WorkerResult;
use crate::logging::JobLogger;

/// How often a running worker refreshes the job's heartbeat.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Run one job to its terminal state and return that state.
///
/// `Err` only when the store cannot be read or written; a failed render
/// is returned as `Ok(JobStatus::Error(..))`.
pub async fn execute_job<R>(store: &JobStore, renderer: &R, job_id: &JobId) -> WorkerResult<JobStatus>
where
    R: RenderCapability + ?Sized,
{
    let logger = JobLogger::new(job_id, "render_video");
    let span = logger.create_span();
    run(store, renderer, job_id, &logger).instrument(span).await
}

async fn run<R>(
    store: &JobStore,
    renderer: &R,
    job_id: &JobId,
    logger: &JobLogger,
) -> WorkerResult<JobStatus>
where
    R: RenderCapability + ?Sized,
{
    let spec = store.load_spec(job_id).await?;
    store.transition(job_id, &JobStatus::Processing).await?;
    logger.log_start(&format!("folder_id={} title={:?}", spec.folder_id, spec.title));

    let request = RenderRequest {
        folder_id: spec.folder_id,
        title: spec.title,
        output_path: store.artifact_path(job_id),
        work_dir: store.job_dir(job_id),
    };

    store.record_heartbeat(job_id).await?;
    let heartbeat = tokio::spawn(heartbeat_loop(store.clone(), job_id.clone()));

    let started = Instant::now();
    let rendered = renderer.render(&request).await;
    heartbeat.abort();

    let status = match rendered {
        Ok(()) => {
            logger.log_completion(&format!("rendered in {:.1}s", started.elapsed().as_secs_f64()));
            JobStatus::Done
        }
        Err(e) => {
            let message = e.to_string();
            logger.log_error(&message);
            // done <=> artifact present, so drop anything half-written
            if let Err(cleanup) = store.remove_artifact(job_id).await {
                logger.log_warning(&format!("failed to remove partial artifact: {}", cleanup));
            }
            JobStatus::error(message)
        }
    };

    store.transition(job_id, &status).await?;
    Ok(status)
}

async fn heartbeat_loop(store: JobStore, job_id: JobId) {
    loop {
        tokio::time::sleep(HEARTBEAT_INTERVAL).await;
        if let Err(e) = store.record_heartbeat(&job_id).await {
            warn!(job_id = %job_id, "Failed to record heartbeat: {}", e);
        }
    }
}
