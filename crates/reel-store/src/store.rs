//! Job store backed by one directory per job.
//!
//! Layout under the task root:
//!
//! ```text
//! <root>/<job_id>/status.txt   status marker (processing | done | error: <msg>)
//! <root>/<job_id>/job.json     JobSpec written at creation
//! <root>/<job_id>/output.mp4   artifact, present once the job is done
//! <root>/<job_id>/heartbeat    RFC 3339 time a worker last reported in
//! ```
//!
//! Nothing is cached in memory. Every read goes to disk, which is how the
//! API process sees what a separate worker process wrote.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use reel_models::{JobId, JobSpec, JobStatus};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Status marker file name.
pub const STATUS_FILE: &str = "status.txt";
/// Job spec file name.
pub const SPEC_FILE: &str = "job.json";
/// Rendered artifact file name.
pub const ARTIFACT_FILE: &str = "output.mp4";
/// Worker heartbeat file name.
pub const HEARTBEAT_FILE: &str = "heartbeat";

/// Filesystem job store.
#[derive(Debug, Clone)]
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    /// Create a store rooted at `root`. Call [`JobStore::init`] before use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Task root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the task root if it does not exist.
    pub async fn init(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.root).await?;
        info!("Job store ready at {}", self.root.display());
        Ok(())
    }

    /// Directory holding everything for one job. Also the render work dir.
    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.root.join(job_id.as_str())
    }

    /// Where the rendered artifact is expected, whether or not it exists yet.
    pub fn artifact_path(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join(ARTIFACT_FILE)
    }

    fn status_path(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join(STATUS_FILE)
    }

    fn spec_path(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join(SPEC_FILE)
    }

    fn heartbeat_path(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join(HEARTBEAT_FILE)
    }

    /// Allocate storage for a new job and mark it `processing`.
    ///
    /// The directory must not exist yet. When this returns, `get_status`
    /// for the job succeeds.
    pub async fn create(&self, spec: &JobSpec) -> StoreResult<()> {
        let dir = self.job_dir(&spec.id);
        fs::create_dir(&dir)
            .await
            .map_err(|e| StoreError::allocation(&dir, e))?;

        let json = serde_json::to_vec_pretty(spec)?;
        write_atomic(&self.spec_path(&spec.id), &json).await?;
        self.set_status(&spec.id, &JobStatus::Processing).await?;

        debug!(job_id = %spec.id, "Allocated job directory {}", dir.display());
        Ok(())
    }

    /// Load the spec written at creation.
    pub async fn load_spec(&self, job_id: &JobId) -> StoreResult<JobSpec> {
        let bytes = fs::read(self.spec_path(job_id))
            .await
            .map_err(|e| not_found_or_io(e, job_id))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Overwrite the status marker.
    ///
    /// Readers see either the old or the new marker, never a partial one.
    /// Does not check the current state; see [`JobStore::transition`].
    pub async fn set_status(&self, job_id: &JobId, status: &JobStatus) -> StoreResult<()> {
        if !fs::try_exists(self.job_dir(job_id)).await? {
            return Err(StoreError::not_found(job_id.as_str()));
        }
        write_atomic(&self.status_path(job_id), status.to_marker().as_bytes()).await?;
        debug!(job_id = %job_id, status = status.as_str(), "Status written");
        Ok(())
    }

    /// Move a job to `status`, refusing to leave a terminal state.
    ///
    /// Writing the terminal state a job is already in is a no-op.
    pub async fn transition(&self, job_id: &JobId, status: &JobStatus) -> StoreResult<()> {
        let current = self.get_status(job_id).await?;
        if current.is_terminal() {
            if &current == status {
                return Ok(());
            }
            return Err(StoreError::TerminalState {
                job_id: job_id.to_string(),
                status: current,
            });
        }
        self.set_status(job_id, status).await
    }

    /// Read the last stored status.
    pub async fn get_status(&self, job_id: &JobId) -> StoreResult<JobStatus> {
        let marker = fs::read_to_string(self.status_path(job_id))
            .await
            .map_err(|e| not_found_or_io(e, job_id))?;
        Ok(JobStatus::from_marker(&marker))
    }

    /// Check whether the artifact file is present.
    pub async fn artifact_exists(&self, job_id: &JobId) -> bool {
        fs::metadata(self.artifact_path(job_id))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Remove a partial artifact left behind by a failed render.
    pub async fn remove_artifact(&self, job_id: &JobId) -> StoreResult<()> {
        match fs::remove_file(self.artifact_path(job_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Ids of every job directory under the root, in no particular order.
    ///
    /// Entries whose name is not a job id are skipped.
    pub async fn list_jobs(&self) -> StoreResult<Vec<JobId>> {
        let mut jobs = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(id) = JobId::parse(&entry.file_name().to_string_lossy()) {
                jobs.push(id);
            }
        }
        Ok(jobs)
    }

    /// Record that a worker owns the job and is alive now.
    pub async fn record_heartbeat(&self, job_id: &JobId) -> StoreResult<()> {
        self.record_heartbeat_at(job_id, Utc::now()).await
    }

    /// Record a heartbeat with an explicit timestamp.
    pub async fn record_heartbeat_at(&self, job_id: &JobId, at: DateTime<Utc>) -> StoreResult<()> {
        if !fs::try_exists(self.job_dir(job_id)).await? {
            return Err(StoreError::not_found(job_id.as_str()));
        }
        write_atomic(&self.heartbeat_path(job_id), at.to_rfc3339().as_bytes()).await
    }

    /// Last heartbeat, or `None` if no worker was ever started for the job.
    ///
    /// An unreadable timestamp counts as the oldest possible heartbeat, so the
    /// job is treated as stale rather than never started.
    pub async fn last_heartbeat(&self, job_id: &JobId) -> StoreResult<Option<DateTime<Utc>>> {
        match fs::read_to_string(self.heartbeat_path(job_id)).await {
            Ok(text) => Ok(Some(
                DateTime::parse_from_rfc3339(text.trim())
                    .map(|t| t.with_timezone(&Utc))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify the task root accepts writes (readiness check).
    pub async fn check_writable(&self) -> StoreResult<()> {
        let marker = self.root.join(format!(".write-check-{}", Uuid::new_v4()));
        fs::write(&marker, b"ok").await?;
        fs::remove_file(&marker).await?;
        Ok(())
    }
}

fn not_found_or_io(e: std::io::Error, job_id: &JobId) -> StoreError {
    if e.kind() == ErrorKind::NotFound {
        StoreError::not_found(job_id.as_str())
    } else {
        StoreError::Io(e)
    }
}

/// Write `contents` to a uniquely named temp file next to `path`, then
/// rename it over `path`.
async fn write_atomic(path: &Path, contents: &[u8]) -> StoreResult<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    fs::write(&tmp, contents).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, JobStore) {
        let dir = TempDir::new().unwrap();
        let store = JobStore::new(dir.path().join("tasks"));
        store.init().await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_create_marks_processing() {
        let (_dir, store) = store().await;
        let spec = JobSpec::new("F1", "Test");

        store.create(&spec).await.unwrap();

        assert_eq!(store.get_status(&spec.id).await.unwrap(), JobStatus::Processing);
        assert_eq!(store.load_spec(&spec.id).await.unwrap(), spec);
        assert!(store.job_dir(&spec.id).is_dir());
        assert!(!store.artifact_exists(&spec.id).await);
    }

    #[tokio::test]
    async fn test_create_twice_is_allocation_error() {
        let (_dir, store) = store().await;
        let spec = JobSpec::new("F1", "Test");

        store.create(&spec).await.unwrap();
        let err = store.create(&spec).await.unwrap_err();
        assert!(matches!(err, StoreError::AllocationError { .. }));
    }

    #[tokio::test]
    async fn test_create_without_root_is_allocation_error() {
        let dir = TempDir::new().unwrap();
        let store = JobStore::new(dir.path().join("missing"));

        let err = store.create(&JobSpec::new("F1", "Test")).await.unwrap_err();
        assert!(matches!(err, StoreError::AllocationError { .. }));
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let (_dir, store) = store().await;
        let id = JobId::new();

        assert!(store.get_status(&id).await.unwrap_err().is_not_found());
        assert!(store.load_spec(&id).await.unwrap_err().is_not_found());
        assert!(store
            .set_status(&id, &JobStatus::Done)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_status_marker_on_disk() {
        let (_dir, store) = store().await;
        let spec = JobSpec::new("F1", "Test");
        store.create(&spec).await.unwrap();

        store
            .set_status(&spec.id, &JobStatus::error("quota exceeded"))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(store.job_dir(&spec.id).join(STATUS_FILE)).unwrap();
        assert_eq!(raw, "error: quota exceeded");

        // No temp files left behind
        let leftovers: Vec<_> = std::fs::read_dir(store.job_dir(&spec.id))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_transition_is_monotonic() {
        let (_dir, store) = store().await;
        let spec = JobSpec::new("F1", "Test");
        store.create(&spec).await.unwrap();

        store.transition(&spec.id, &JobStatus::Processing).await.unwrap();
        store.transition(&spec.id, &JobStatus::Done).await.unwrap();
        // Same terminal state again is fine
        store.transition(&spec.id, &JobStatus::Done).await.unwrap();

        let err = store
            .transition(&spec.id, &JobStatus::error("late failure"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::TerminalState { .. }));

        let err = store
            .transition(&spec.id, &JobStatus::Processing)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::TerminalState { .. }));

        assert_eq!(store.get_status(&spec.id).await.unwrap(), JobStatus::Done);
    }

    #[tokio::test]
    async fn test_jobs_are_independent() {
        let (_dir, store) = store().await;
        let a = JobSpec::new("FA", "A");
        let b = JobSpec::new("FB", "B");
        store.create(&a).await.unwrap();
        store.create(&b).await.unwrap();

        store.transition(&b.id, &JobStatus::Done).await.unwrap();

        assert_eq!(store.get_status(&a.id).await.unwrap(), JobStatus::Processing);
        assert_eq!(store.get_status(&b.id).await.unwrap(), JobStatus::Done);
    }

    #[tokio::test]
    async fn test_artifact_path_and_removal() {
        let (_dir, store) = store().await;
        let spec = JobSpec::new("F1", "Test");
        store.create(&spec).await.unwrap();

        let path = store.artifact_path(&spec.id);
        assert_eq!(path, store.job_dir(&spec.id).join(ARTIFACT_FILE));

        fs::write(&path, b"partial").await.unwrap();
        assert!(store.artifact_exists(&spec.id).await);

        store.remove_artifact(&spec.id).await.unwrap();
        assert!(!store.artifact_exists(&spec.id).await);
        // Removing again is a no-op
        store.remove_artifact(&spec.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_readers_never_see_torn_marker() {
        let (_dir, store) = store().await;
        let spec = JobSpec::new("F1", "Test");
        store.create(&spec).await.unwrap();

        let long_message = "x".repeat(64 * 1024);
        let expected = JobStatus::error(long_message.clone());

        let writer = {
            let store = store.clone();
            let id = spec.id.clone();
            let status = expected.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    store.set_status(&id, &JobStatus::Processing).await.unwrap();
                    store.set_status(&id, &status).await.unwrap();
                }
            })
        };

        for _ in 0..200 {
            let status = store.get_status(&spec.id).await.unwrap();
            assert!(status == JobStatus::Processing || status == expected);
        }
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_list_jobs_skips_foreign_entries() {
        let (_dir, store) = store().await;
        let a = JobSpec::new("FA", "A");
        let b = JobSpec::new("FB", "B");
        store.create(&a).await.unwrap();
        store.create(&b).await.unwrap();
        fs::create_dir(store.root().join("not-a-job")).await.unwrap();
        fs::write(store.root().join(".write-check"), b"x").await.unwrap();

        let mut jobs = store.list_jobs().await.unwrap();
        jobs.sort_by(|x, y| x.as_str().cmp(y.as_str()));
        let mut expected = vec![a.id, b.id];
        expected.sort_by(|x, y| x.as_str().cmp(y.as_str()));
        assert_eq!(jobs, expected);
    }

    #[tokio::test]
    async fn test_heartbeat() {
        let (_dir, store) = store().await;
        let spec = JobSpec::new("F1", "T");
        store.create(&spec).await.unwrap();

        assert_eq!(store.last_heartbeat(&spec.id).await.unwrap(), None);

        let at = Utc::now() - chrono::Duration::minutes(5);
        store.record_heartbeat_at(&spec.id, at).await.unwrap();
        let seen = store.last_heartbeat(&spec.id).await.unwrap().unwrap();
        assert_eq!(seen.timestamp(), at.timestamp());

        store.record_heartbeat(&spec.id).await.unwrap();
        assert!(store.last_heartbeat(&spec.id).await.unwrap().unwrap() > at);

        let unknown = JobId::new();
        assert!(store.record_heartbeat(&unknown).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_check_writable() {
        let (_dir, store) = store().await;
        store.check_writable().await.unwrap();
    }
}
