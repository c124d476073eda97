//! The render seam the worker depends on.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::RenderResult;

/// One render invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Source folder holding up to eight images and one audio track
    pub folder_id: String,
    /// Title drawn over the video
    pub title: String,
    /// Where the finished video must be written
    pub output_path: PathBuf,
    /// Scratch directory owned by this job
    pub work_dir: PathBuf,
}

/// Turns a source folder and a title into a video file.
///
/// Implementations may take minutes. On success a file exists at
/// `output_path`; on failure the error carries a human-readable message.
#[async_trait]
pub trait RenderCapability: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> RenderResult<()>;
}
