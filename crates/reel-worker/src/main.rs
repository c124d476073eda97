//! Render worker binary. Spawned by the API once per job.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_models::JobId;
use reel_render::{CommandRenderer, RenderConfig};
use reel_store::JobStore;
use reel_worker::{execute_job, WorkerError};

#[derive(Parser, Debug)]
#[command(name = "reel-worker")]
#[command(about = "Render one reel job and record its outcome", long_about = None)]
struct Cli {
    /// Directory holding one sub-directory per job
    #[arg(long, env = "TASK_ROOT", default_value = "tasks")]
    task_root: PathBuf,
    /// Job to run
    #[arg(long)]
    job_id: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "reel=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Worker error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), WorkerError> {
    let job_id = JobId::parse(&cli.job_id).ok_or_else(|| WorkerError::invalid_job_id(&cli.job_id))?;

    let config = RenderConfig::from_env();
    info!(job_id = %job_id, "Starting reel-worker, render config: {:?}", config);

    let store = JobStore::new(cli.task_root);
    let renderer = CommandRenderer::new(config);

    let status = execute_job(&store, &renderer, &job_id).await?;
    info!(job_id = %job_id, status = status.as_str(), "Worker finished");
    Ok(())
}
