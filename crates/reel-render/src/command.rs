//! External render program runner.
//!
//! The program is invoked as
//! `<program> [program_args...] <folder_id> <title> <output_path> <work_dir>`
//! with the [`RenderConfig`] exported as `REEL_*` environment variables.
//! Exit status 0 plus a non-empty file at `output_path` means success.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::capability::{RenderCapability, RenderRequest};
use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};

/// Runs the configured render program once per request.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    config: RenderConfig,
}

impl CommandRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Resolve the render program in PATH.
    pub fn resolve_program(&self) -> RenderResult<PathBuf> {
        which::which(&self.config.program)
            .map_err(|_| RenderError::ProgramNotFound(self.config.program.clone()))
    }

    /// Build the full argument list for one request.
    pub fn build_args(&self, request: &RenderRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = self
            .config
            .program_args
            .iter()
            .map(OsString::from)
            .collect();
        args.push(OsString::from(&request.folder_id));
        args.push(OsString::from(&request.title));
        args.push(request.output_path.clone().into_os_string());
        args.push(request.work_dir.clone().into_os_string());
        args
    }
}

#[async_trait]
impl RenderCapability for CommandRenderer {
    async fn render(&self, request: &RenderRequest) -> RenderResult<()> {
        let program = self.resolve_program()?;
        let args = self.build_args(request);

        info!(
            folder_id = %request.folder_id,
            output = %request.output_path.display(),
            "Running render program {}",
            program.display()
        );

        let mut child = Command::new(&program)
            .args(&args)
            .envs(self.config.program_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take();
        let stdout_task = tokio::spawn(async move {
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(stream = "stdout", "{}", line);
                }
            }
        });

        // Keep the last non-empty stderr line: that is the failure message.
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut last_line: Option<String> = None;
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(stream = "stderr", "{}", line);
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        last_line = Some(trimmed.to_string());
                    }
                }
            }
            last_line
        });

        let status = match self.config.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait()).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(
                        "Render program timed out after {} seconds, killing it",
                        timeout.as_secs()
                    );
                    let _ = child.kill().await;
                    return Err(RenderError::Timeout(timeout.as_secs()));
                }
            },
            None => child.wait().await?,
        };

        let _ = stdout_task.await;
        let last_stderr = stderr_task.await.ok().flatten();

        if !status.success() {
            let message = last_stderr
                .unwrap_or_else(|| format!("render program exited with {}", status));
            return Err(RenderError::failed(message, status.code()));
        }

        let produced = tokio::fs::metadata(&request.output_path)
            .await
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(RenderError::MissingOutput(request.output_path.clone()));
        }

        info!(output = %request.output_path.display(), "Render finished");
        Ok(())
    }
}
