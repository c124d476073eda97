//! Render capability for short-form videos.
//!
//! The core service never looks inside rendering. It only needs:
//! - [`RenderCapability`]: "render(folder, title) into this file, or fail with a message"
//! - [`RenderConfig`]: every path and constant the renderer needs, passed explicitly
//! - [`CommandRenderer`]: the production implementation, which runs an
//!   external render program as a child process

pub mod capability;
pub mod command;
pub mod config;
pub mod error;

pub use capability::{RenderCapability, RenderRequest};
pub use command::CommandRenderer;
pub use config::{RenderConfig, Resolution};
pub use error::{RenderError, RenderResult};
