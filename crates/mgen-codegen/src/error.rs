//! Code generation error types.

use thiserror::Error;

/// Result type for code generation.
pub type CodegenResult<T> = Result<T, CodegenError>;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Generative API request failed: {0}")]
    RequestFailed(String),

    #[error("Generative API returned no content")]
    EmptyResponse,

    #[error("Generated code is invalid: {0}")]
    InvalidSource(String),

    #[error("Failed to generate valid code after {attempts} attempts. Last error: {last_error}")]
    GenerationExhausted { attempts: u32, last_error: String },
}

impl CodegenError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::InvalidSource(msg.into())
    }

    pub fn generation_exhausted(attempts: u32, last_error: impl Into<String>) -> Self {
        Self::GenerationExhausted {
            attempts,
            last_error: last_error.into(),
        }
    }

    /// Whether another generation attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CodegenError::RequestFailed(_)
                | CodegenError::EmptyResponse
                | CodegenError::InvalidSource(_)
        )
    }
}
