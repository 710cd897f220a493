//! Bounded generate → check → render → recover loop.
//!
//! Each cycle obtains a script from the generator, runs the static issue
//! detector on it, and renders it when the check passes. Any failure is fed
//! back into the next generation request. A cycle consumes exactly one
//! attempt whether it stopped at the static check or at the renderer, so a
//! budget of `N` never yields more than `N` cycles.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::counter;

use mgen_codegen::{
    CodeGenerator, CodegenConfig, OpenAiClient, ScriptSource, StaticCheck, StaticIssueDetector,
};
use mgen_models::{GeneratedSource, GenerationRequest, RenderOutcome, TargetProfile};
use mgen_render::{RenderConfig, RenderExecutor, Renderer};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

/// Where a loop invocation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Generating,
    StaticChecking,
    Rendering,
    Succeeded,
    Failed,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoopState::Generating => "generating",
            LoopState::StaticChecking => "static_checking",
            LoopState::Rendering => "rendering",
            LoopState::Succeeded => "succeeded",
            LoopState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Everything a loop invocation produced, including on failure.
#[derive(Debug)]
pub struct LoopRun {
    /// Artifact path, or the terminal error
    pub outcome: WorkerResult<PathBuf>,
    /// Cycles consumed
    pub attempts: u32,
    /// Last script the generator returned
    pub last_source: Option<GeneratedSource>,
}

/// Successful loop result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedVideo {
    pub artifact_path: PathBuf,
    pub attempts: u32,
    pub source: GeneratedSource,
}

pub struct RecoveryLoop {
    generator: Arc<dyn ScriptSource>,
    detector: StaticIssueDetector,
    renderer: Arc<dyn Renderer>,
}

impl RecoveryLoop {
    pub fn new(
        generator: Arc<dyn ScriptSource>,
        detector: StaticIssueDetector,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            generator,
            detector,
            renderer,
        }
    }

    /// Wire the production collaborators: OpenAI-compatible generator and
    /// the subprocess render executor, both targeting `profile`.
    pub fn from_config(
        codegen: CodegenConfig,
        render: RenderConfig,
        profile: TargetProfile,
    ) -> WorkerResult<Self> {
        let profile = Arc::new(profile);
        let client = Arc::new(OpenAiClient::new(&codegen)?);
        let generator = CodeGenerator::new(client, profile.clone(), codegen);
        let detector = StaticIssueDetector::from_profile(&profile);
        let renderer = RenderExecutor::new(render, profile);

        Ok(Self::new(Arc::new(generator), detector, Arc::new(renderer)))
    }

    /// Produce a video for `prompt` in `output_dir`, spending at most
    /// `max_retries` cycles.
    pub async fn produce_video(
        &self,
        prompt: &str,
        output_dir: &Path,
        max_retries: u32,
    ) -> WorkerResult<ProducedVideo> {
        let label = output_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "adhoc".to_string());
        let logger = JobLogger::from_string(&label, "produce_video");

        let run = self.run(prompt, output_dir, max_retries, &logger).await;
        let artifact_path = run.outcome?;
        let source = run
            .last_source
            .ok_or_else(|| WorkerError::rendering_failed(run.attempts, "no source generated"))?;

        Ok(ProducedVideo {
            artifact_path,
            attempts: run.attempts,
            source,
        })
    }

    /// Run the loop and report everything it produced.
    pub async fn run(
        &self,
        prompt: &str,
        output_dir: &Path,
        max_retries: u32,
        logger: &JobLogger,
    ) -> LoopRun {
        let mut request = GenerationRequest::new(prompt);
        let mut attempts = 0u32;
        let mut current: Option<GeneratedSource> = None;
        let mut last_reason = String::from("retry budget is zero");

        logger.log_start(&format!("max_retries={}", max_retries));

        while attempts < max_retries {
            let source = match self.generator.generate(&request).await {
                Ok(source) => source,
                Err(e) => {
                    logger.log_error(&e.to_string());
                    return LoopRun {
                        outcome: Err(e.into()),
                        attempts,
                        last_source: current,
                    };
                }
            };
            attempts += 1;

            if let StaticCheck::Failed { symbol, reason } = self.detector.check(&source.text) {
                counter!("mgen_recovery_failures_total", "stage" => "static_check").increment(1);
                logger.log_attempt_failed(
                    attempts,
                    max_retries,
                    &LoopState::StaticChecking.to_string(),
                    &reason,
                );
                tracing::debug!(symbol = %symbol, "Static issue detected, skipping render");

                current = Some(source);
                last_reason = reason;
                request = request.regenerate(last_reason.clone());
                continue;
            }

            logger.log_progress(&format!(
                "attempt {}/{}: rendering scene {}",
                attempts, max_retries, source.entry_scene
            ));

            let reason = match self.renderer.render(&source.text, output_dir).await {
                Ok(RenderOutcome::Success { artifact_path }) => {
                    counter!("mgen_recovery_runs_total", "result" => "succeeded").increment(1);
                    logger.log_completion(&format!(
                        "{} after {} attempt(s)",
                        artifact_path.display(),
                        attempts
                    ));
                    return LoopRun {
                        outcome: Ok(artifact_path),
                        attempts,
                        last_source: Some(source),
                    };
                }
                Ok(failure) => {
                    counter!("mgen_recovery_failures_total", "stage" => failure.label())
                        .increment(1);
                    failure.failure_reason().unwrap_or_default().to_string()
                }
                // Not a classified outcome; treated like a retryable failure.
                Err(e) => {
                    counter!("mgen_recovery_failures_total", "stage" => "executor_error")
                        .increment(1);
                    e.to_string()
                }
            };

            logger.log_attempt_failed(
                attempts,
                max_retries,
                &LoopState::Rendering.to_string(),
                &reason,
            );
            current = Some(source);
            last_reason = reason;
            request = request.regenerate(last_reason.clone());
        }

        counter!("mgen_recovery_runs_total", "result" => "failed").increment(1);
        logger.log_error(&format!(
            "{} after {} attempts: {}",
            LoopState::Failed,
            attempts,
            last_reason
        ));

        LoopRun {
            outcome: Err(WorkerError::rendering_failed(attempts, last_reason)),
            attempts,
            last_source: current,
        }
    }
}
