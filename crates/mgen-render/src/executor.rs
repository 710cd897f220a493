//! Render executor: script text in, [`RenderOutcome`] out.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use metrics::{counter, histogram};
use tokio::fs;
use tracing::{debug, info, warn};

use mgen_models::{FatalKind, RenderOutcome, TargetProfile};
use mgen_script::find_entry_scene;

use crate::classifier::FailureClassifier;
use crate::command::{RenderCommand, RenderRunner};
use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::fs_utils::{copy_artifact, ensure_open_dir, relax_file_permissions};
use crate::locate::{final_artifact_path, locate_artifact};

/// Renders a script into a video under `output_dir`.
///
/// Expected failures come back as `Ok(RenderOutcome::..Failure)`; `Err` is
/// reserved for problems outside the script (missing binary, IO).
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, source: &str, output_dir: &Path) -> RenderResult<RenderOutcome>;
}

pub struct RenderExecutor {
    config: RenderConfig,
    profile: Arc<TargetProfile>,
    classifier: FailureClassifier,
    runner: RenderRunner,
}

impl RenderExecutor {
    pub fn new(config: RenderConfig, profile: Arc<TargetProfile>) -> Self {
        let runner = match config.timeout_secs {
            Some(secs) => RenderRunner::new().with_timeout(secs),
            None => RenderRunner::new(),
        };

        Self {
            config,
            profile,
            classifier: FailureClassifier::default(),
            runner,
        }
    }

    /// Replace the default failure classifier.
    pub fn with_classifier(mut self, classifier: FailureClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    async fn render_inner(&self, source: &str, output_dir: &Path) -> RenderResult<RenderOutcome> {
        ensure_open_dir(output_dir).await?;

        let script_path = output_dir.join(&self.config.script_name);
        fs::write(&script_path, source).await?;
        relax_file_permissions(&script_path).await;

        let scene = match find_entry_scene(source, &self.profile)? {
            Some(scene) => scene,
            None => {
                return Ok(RenderOutcome::fatal(
                    FatalKind::NoEntryScene,
                    "No Scene class found in the generated code",
                ))
            }
        };

        // Output from an earlier attempt must not pass as this one.
        let destination = final_artifact_path(&self.config, output_dir, &scene);
        if fs::try_exists(&destination).await.unwrap_or(false) {
            fs::remove_file(&destination).await?;
        }
        remove_scratch_media(output_dir).await?;
        let not_before = run_started_at();

        let cmd = RenderCommand::new(&self.config.renderer_bin, &script_path, &scene)
            .leading_args(self.config.renderer_args.iter().cloned())
            .quality(self.config.quality)
            .format(&self.config.format)
            .working_dir(output_dir);

        info!(scene = %scene, dir = %output_dir.display(), "Rendering scene");

        let run = match self.runner.run(&cmd).await {
            Ok(run) => run,
            Err(RenderError::Timeout(secs)) => {
                return Ok(RenderOutcome::fatal(
                    FatalKind::TimedOut,
                    format!("Renderer timed out after {} seconds", secs),
                ))
            }
            Err(e) => return Err(e),
        };

        if !run.success {
            debug!(exit_code = ?run.exit_code, "Renderer stderr:\n{}", run.stderr);

            return Ok(match self.classifier.classify(&run.stderr) {
                Some(c) if c.retryable => RenderOutcome::retryable(c.category, c.message),
                Some(c) => RenderOutcome::fatal(FatalKind::RendererFailed, c.message),
                None => {
                    let stderr = run.stderr.trim();
                    let message = if stderr.is_empty() {
                        format!("Renderer exited with status {:?}", run.exit_code)
                    } else {
                        stderr.to_string()
                    };
                    RenderOutcome::fatal(FatalKind::RendererFailed, message)
                }
            });
        }

        let located = locate_artifact(&self.config, output_dir, &scene, Some(not_before)).await?;
        let Some(artifact) = located else {
            warn!(scene = %scene, "Renderer succeeded but no video file was found");
            return Ok(RenderOutcome::fatal(
                FatalKind::ArtifactNotLocated,
                "artifact not located",
            ));
        };

        let size = copy_artifact(&artifact, &destination).await?;
        if size == 0 {
            return Ok(RenderOutcome::fatal(
                FatalKind::EmptyArtifact,
                format!("Copied artifact is empty: {}", destination.display()),
            ));
        }

        info!(
            scene = %scene,
            size_bytes = size,
            path = %destination.display(),
            "Render completed"
        );
        Ok(RenderOutcome::success(destination))
    }
}

/// Drop the renderer's `media/` tree left by a previous attempt.
async fn remove_scratch_media(output_dir: &Path) -> RenderResult<()> {
    match fs::remove_dir_all(output_dir.join("media")).await {
        Ok(()) => {
            debug!(dir = %output_dir.display(), "Removed previous render scratch tree");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Current time rounded down to whole seconds; file mtimes can be coarser
/// than the system clock.
fn run_started_at() -> SystemTime {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    UNIX_EPOCH + Duration::from_secs(secs)
}

#[async_trait]
impl Renderer for RenderExecutor {
    async fn render(&self, source: &str, output_dir: &Path) -> RenderResult<RenderOutcome> {
        let started = Instant::now();
        let result = self.render_inner(source, output_dir).await;

        let label = match &result {
            Ok(outcome) => outcome.label(),
            Err(_) => "error",
        };
        counter!("mgen_render_outcomes_total", "outcome" => label).increment(1);
        histogram!("mgen_render_duration_seconds").record(started.elapsed().as_secs_f64());

        result
    }
}
