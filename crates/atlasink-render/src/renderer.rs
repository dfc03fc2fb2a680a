//! Render crate errors.

use atlasink_core::{ConfigError, IconError, PersistError};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid drawing: {0}")]
    State(#[from] PersistError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Icon error: {0}")]
    Icon(#[from] IconError),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;
