//! Retrying scene-script generator.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::{info, warn};

use mgen_models::{GeneratedSource, GenerationRequest, TargetProfile};
use mgen_script::{check_syntax, find_entry_scene, ScriptError};

use crate::client::{CompletionRequest, TextGenerator};
use crate::config::CodegenConfig;
use crate::error::{CodegenError, CodegenResult};
use crate::prompt::{system_prompt, user_prompt};
use crate::sanitize::sanitize;

/// Anything that can turn a generation request into a valid scene script.
///
/// The recovery loop depends on this seam rather than on [`CodeGenerator`]
/// directly.
#[async_trait]
pub trait ScriptSource: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> CodegenResult<GeneratedSource>;
}

/// Generates scene scripts and retries until one parses.
pub struct CodeGenerator {
    client: Arc<dyn TextGenerator>,
    profile: Arc<TargetProfile>,
    config: CodegenConfig,
    system_prompt: String,
}

impl CodeGenerator {
    pub fn new(
        client: Arc<dyn TextGenerator>,
        profile: Arc<TargetProfile>,
        config: CodegenConfig,
    ) -> Self {
        let system_prompt = system_prompt(&profile);
        Self {
            client,
            profile,
            config,
            system_prompt,
        }
    }

    /// Profile this generator targets.
    pub fn profile(&self) -> &TargetProfile {
        &self.profile
    }

    /// Generate a script, spending at most `max_retries` calls to the model.
    ///
    /// Parse failures are fed back into the next call. API failures are
    /// retried with backoff but do not replace the feedback text.
    pub async fn generate_with_budget(
        &self,
        request: &GenerationRequest,
        max_retries: u32,
    ) -> CodegenResult<GeneratedSource> {
        let mut feedback = request.last_error.clone();
        let mut last_error = String::from("retry budget is zero");

        for attempt in 0..max_retries {
            let current = GenerationRequest {
                prompt: request.prompt.clone(),
                attempt: request.attempt,
                last_error: feedback.clone(),
            };
            let completion = CompletionRequest {
                system_prompt: self.system_prompt.clone(),
                user_prompt: user_prompt(&current, &self.profile),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            };

            match self.client.complete(&completion).await {
                Ok(raw) => match self.validate(&raw) {
                    Ok(source) => {
                        counter!("mgen_generation_attempts_total", "outcome" => "valid").increment(1);
                        info!(
                            attempt = attempt + 1,
                            scene = %source.entry_scene,
                            "Generated code passed syntax check"
                        );
                        return Ok(source);
                    }
                    Err(e) if e.is_retryable() => {
                        counter!("mgen_generation_attempts_total", "outcome" => "invalid").increment(1);
                        warn!(attempt = attempt + 1, error = %e, "Generated code rejected");
                        last_error = e.to_string();
                        feedback = Some(last_error.clone());
                    }
                    Err(e) => return Err(e),
                },
                Err(e) if e.is_retryable() => {
                    counter!("mgen_generation_attempts_total", "outcome" => "request_failed")
                        .increment(1);
                    warn!(attempt = attempt + 1, error = %e, "Generative API call failed");
                    last_error = e.to_string();
                    if attempt + 1 < max_retries {
                        tokio::time::sleep(self.config.delay_for_attempt(attempt + 1)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(CodegenError::generation_exhausted(max_retries, last_error))
    }

    /// Sanitize raw model output and check it is a usable scene script.
    pub fn validate(&self, raw: &str) -> CodegenResult<GeneratedSource> {
        let text = sanitize(raw, &self.profile);

        check_syntax(&text).map_err(|e| match e {
            ScriptError::Syntax(issue) => {
                CodegenError::invalid_source(format!("Syntax error in generated code: {}", issue))
            }
            other => CodegenError::config_error(other.to_string()),
        })?;

        let entry_scene = find_entry_scene(&text, &self.profile)
            .map_err(|e| CodegenError::config_error(e.to_string()))?
            .ok_or_else(|| {
                CodegenError::invalid_source(format!(
                    "No class inheriting from Scene found; define one with a {}(self) method",
                    self.profile.build_method
                ))
            })?;

        Ok(GeneratedSource::new(text, entry_scene))
    }
}

#[async_trait]
impl ScriptSource for CodeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> CodegenResult<GeneratedSource> {
        self.generate_with_budget(request, self.config.max_retries)
            .await
    }
}
