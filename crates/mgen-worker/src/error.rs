//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to render video after {attempts} attempts. Last error: {last_reason}")]
    RenderingFailed { attempts: u32, last_reason: String },

    #[error("Code generation failed: {0}")]
    Generation(#[from] mgen_codegen::CodegenError),

    #[error("Render error: {0}")]
    Render(#[from] mgen_render::RenderError),

    #[error("Storage error: {0}")]
    Storage(#[from] mgen_storage::StorageError),

    #[error("Store error: {0}")]
    Store(#[from] mgen_store::StoreError),

    #[error("Invalid target profile: {0}")]
    Profile(#[from] mgen_models::ProfileError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn rendering_failed(attempts: u32, last_reason: impl Into<String>) -> Self {
        Self::RenderingFailed {
            attempts,
            last_reason: last_reason.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether this is a terminal pipeline failure (budget spent) rather
    /// than an infrastructure problem.
    pub fn is_pipeline_failure(&self) -> bool {
        matches!(
            self,
            WorkerError::RenderingFailed { .. }
                | WorkerError::Generation(mgen_codegen::CodegenError::GenerationExhausted { .. })
        )
    }
}
