//! Error types for render operations.

use thiserror::Error;

use mgen_script::ScriptError;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors the render executor cannot express as a [`RenderOutcome`].
///
/// [`RenderOutcome`]: mgen_models::RenderOutcome
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Renderer binary not found: {0}")]
    RendererNotFound(String),

    #[error("Failed to start renderer: {0}")]
    SpawnFailed(String),

    #[error("Renderer timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid classifier pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Script analysis failed: {0}")]
    Script(#[from] ScriptError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn renderer_not_found(bin: impl Into<String>) -> Self {
        Self::RendererNotFound(bin.into())
    }

    pub fn spawn_failed(message: impl Into<String>) -> Self {
        Self::SpawnFailed(message.into())
    }
}
