//! Render configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Output frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Vertical 9:16 frame used for shorts.
    pub const VERTICAL: Resolution = Resolution {
        width: 576,
        height: 1024,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::VERTICAL
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    /// Parse `WIDTHxHEIGHT`, e.g. `576x1024`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
        let width: u32 = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
        let height: u32 = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
        if width == 0 || height == 0 {
            return Err(format!("resolution must be non-zero, got '{}'", s));
        }
        Ok(Self { width, height })
    }
}

/// Everything the render program needs, passed at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Render program (looked up in PATH unless it contains a separator)
    pub program: String,
    /// Arguments placed before the per-job arguments
    pub program_args: Vec<String>,
    /// Output frame size
    pub resolution: Resolution,
    /// Output frame rate
    pub fps: u32,
    /// Font for word-by-word captions
    pub caption_font: PathBuf,
    /// Font for the title overlay (falls back to the caption font)
    pub title_font: PathBuf,
    /// Google service account key for reading the source folder
    pub service_account_key: PathBuf,
    /// OAuth client secrets, used when no service account key is present
    pub oauth_client_secrets: PathBuf,
    /// Speech transcription model name
    pub whisper_model: String,
    /// Maximum number of images taken from the source folder
    pub max_images: u32,
    /// Kill the render program after this long
    pub timeout: Option<Duration>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            program: "reel-render".to_string(),
            program_args: Vec::new(),
            resolution: Resolution::VERTICAL,
            fps: 24,
            caption_font: PathBuf::from("Roboto-Bold.ttf"),
            title_font: PathBuf::from("Trash Ghostly.ttf"),
            service_account_key: PathBuf::from("service-account-key.json"),
            oauth_client_secrets: PathBuf::from("credentials.json"),
            whisper_model: "base".to_string(),
            max_images: 8,
            timeout: None,
        }
    }
}

impl RenderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            program: std::env::var("RENDER_PROGRAM").unwrap_or(defaults.program),
            program_args: std::env::var("RENDER_PROGRAM_ARGS")
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or(defaults.program_args),
            resolution: std::env::var("RENDER_RESOLUTION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.resolution),
            fps: std::env::var("RENDER_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|fps| *fps > 0)
                .unwrap_or(defaults.fps),
            caption_font: std::env::var("RENDER_CAPTION_FONT")
                .map(PathBuf::from)
                .unwrap_or(defaults.caption_font),
            title_font: std::env::var("RENDER_TITLE_FONT")
                .map(PathBuf::from)
                .unwrap_or(defaults.title_font),
            service_account_key: std::env::var("RENDER_SERVICE_ACCOUNT_KEY")
                .map(PathBuf::from)
                .unwrap_or(defaults.service_account_key),
            oauth_client_secrets: std::env::var("RENDER_OAUTH_CLIENT_SECRETS")
                .map(PathBuf::from)
                .unwrap_or(defaults.oauth_client_secrets),
            whisper_model: std::env::var("RENDER_WHISPER_MODEL").unwrap_or(defaults.whisper_model),
            max_images: std::env::var("RENDER_MAX_IMAGES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_images),
            timeout: std::env::var("RENDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }

    /// Environment handed to the render program.
    pub fn program_env(&self) -> Vec<(&'static str, String)> {
        vec![
            ("REEL_WIDTH", self.resolution.width.to_string()),
            ("REEL_HEIGHT", self.resolution.height.to_string()),
            ("REEL_FPS", self.fps.to_string()),
            ("REEL_CAPTION_FONT", self.caption_font.display().to_string()),
            ("REEL_TITLE_FONT", self.title_font.display().to_string()),
            (
                "REEL_SERVICE_ACCOUNT_KEY",
                self.service_account_key.display().to_string(),
            ),
            (
                "REEL_OAUTH_CLIENT_SECRETS",
                self.oauth_client_secrets.display().to_string(),
            ),
            ("REEL_WHISPER_MODEL", self.whisper_model.clone()),
            ("REEL_MAX_IMAGES", self.max_images.to_string()),
        ]
    }
}
