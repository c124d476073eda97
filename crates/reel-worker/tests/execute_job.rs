//! Worker lifecycle tests with in-process renderers.

use std::sync::Mutex;

use async_trait::async_trait;
use reel_models::{JobSpec, JobStatus};
use reel_render::{RenderCapability, RenderError, RenderRequest, RenderResult};
use reel_store::JobStore;
use reel_worker::{execute_job, WorkerError};
use tempfile::TempDir;

/// Writes fixed bytes to the output path.
struct WritingRenderer {
    bytes: Vec<u8>,
    seen: Mutex<Vec<RenderRequest>>,
}

impl WritingRenderer {
    fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RenderCapability for WritingRenderer {
    async fn render(&self, request: &RenderRequest) -> RenderResult<()> {
        self.seen.lock().unwrap().push(request.clone());
        tokio::fs::write(&request.output_path, &self.bytes).await?;
        Ok(())
    }
}

/// Writes a partial file, then fails.
struct FailingRenderer {
    message: String,
}

#[async_trait]
impl RenderCapability for FailingRenderer {
    async fn render(&self, request: &RenderRequest) -> RenderResult<()> {
        tokio::fs::write(&request.output_path, b"partial").await?;
        Err(RenderError::failed(self.message.clone(), Some(1)))
    }
}

async fn store_with_job() -> (TempDir, JobStore, JobSpec) {
    let dir = TempDir::new().unwrap();
    let store = JobStore::new(dir.path().join("tasks"));
    store.init().await.unwrap();
    let spec = JobSpec::new("F1", "Test");
    store.create(&spec).await.unwrap();
    (dir, store, spec)
}

#[tokio::test]
async fn test_successful_render_marks_done() {
    let (_dir, store, spec) = store_with_job().await;
    let renderer = WritingRenderer::new(b"mp4 bytes");

    let status = execute_job(&store, &renderer, &spec.id).await.unwrap();

    assert_eq!(status, JobStatus::Done);
    assert_eq!(store.get_status(&spec.id).await.unwrap(), JobStatus::Done);
    assert_eq!(
        std::fs::read(store.artifact_path(&spec.id)).unwrap(),
        b"mp4 bytes"
    );

    let seen = renderer.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].folder_id, "F1");
    assert_eq!(seen[0].title, "Test");
    assert_eq!(seen[0].output_path, store.artifact_path(&spec.id));
    assert_eq!(seen[0].work_dir, store.job_dir(&spec.id));
    drop(seen);

    // The worker announced itself before rendering
    assert!(store.last_heartbeat(&spec.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_failed_render_marks_error_with_message() {
    let (_dir, store, spec) = store_with_job().await;
    let renderer = FailingRenderer {
        message: "No audio file found in folder F1".into(),
    };

    let status = execute_job(&store, &renderer, &spec.id).await.unwrap();

    let expected = JobStatus::error("No audio file found in folder F1");
    assert_eq!(status, expected);
    assert_eq!(store.get_status(&spec.id).await.unwrap(), expected);
    // No artifact for a failed job, even if the renderer left one behind
    assert!(!store.artifact_exists(&spec.id).await);
}

#[tokio::test]
async fn test_terminal_job_is_not_rerun() {
    let (_dir, store, spec) = store_with_job().await;
    let failing = FailingRenderer {
        message: "boom".into(),
    };
    execute_job(&store, &failing, &spec.id).await.unwrap();

    let renderer = WritingRenderer::new(b"late");
    let err = execute_job(&store, &renderer, &spec.id).await.unwrap_err();

    assert!(matches!(err, WorkerError::Store(_)));
    assert!(renderer.seen.lock().unwrap().is_empty());
    assert_eq!(
        store.get_status(&spec.id).await.unwrap(),
        JobStatus::error("boom")
    );
}

#[tokio::test]
async fn test_unknown_job_is_store_error() {
    let (_dir, store, _spec) = store_with_job().await;
    let renderer = WritingRenderer::new(b"x");

    let err = execute_job(&store, &renderer, &reel_models::JobId::new())
        .await
        .unwrap_err();

    match err {
        WorkerError::Store(e) => assert!(e.is_not_found()),
        other => panic!("unexpected error: {other:?}"),
    }
}
