//! Code generator configuration.

use std::time::Duration;

use crate::error::{CodegenError, CodegenResult};

/// OpenAI-compatible chat completions endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Generative API and retry configuration.
#[derive(Debug, Clone)]
pub struct CodegenConfig {
    /// API key (bearer token)
    pub api_key: String,
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Response token budget
    pub max_tokens: u32,
    /// Sampling temperature, kept low for repeatable code
    pub temperature: f32,
    /// Attempts per `generate` call
    pub max_retries: u32,
    /// Delay before retrying after a failed API call (doubles each time)
    pub retry_base_delay: Duration,
    /// Upper bound on the retry delay
    pub retry_max_delay: Duration,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gpt-4-turbo".to_string(),
            max_tokens: 3000,
            temperature: 0.5,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(8),
        }
    }
}

impl CodegenConfig {
    /// Create config from environment variables.
    pub fn from_env() -> CodegenResult<Self> {
        let defaults = Self::default();
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| CodegenError::config_error("OPENAI_API_KEY not set"))?;

        Ok(Self {
            api_key,
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.model),
            max_tokens: std::env::var("OPENAI_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_tokens),
            temperature: std::env::var("OPENAI_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.temperature),
            max_retries: std::env::var("CODEGEN_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            ..defaults
        })
    }

    /// Delay before retry number `attempt` (1-based).
    pub(crate) fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_base_delay
            .saturating_mul(factor)
            .min(self.retry_max_delay)
    }
}
