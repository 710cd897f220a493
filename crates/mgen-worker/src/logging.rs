//! Structured job logging utilities.

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mgen_models::VideoId;

/// Initialise tracing for a binary.
///
/// `RUST_LOG` overrides `default_filter`. `LOG_FORMAT=json` switches from
/// coloured output to JSON lines.
pub fn init_tracing(default_filter: &str) {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Logs pipeline lifecycle events with the video ID and operation attached.
#[derive(Debug, Clone)]
pub struct JobLogger {
    video_id: String,
    operation: String,
}

impl JobLogger {
    /// Create a logger for a video and operation (e.g. "generate", "render").
    pub fn new(video_id: &VideoId, operation: &str) -> Self {
        Self::from_string(video_id.as_str(), operation)
    }

    /// Create a logger from a plain label, for runs without a record.
    pub fn from_string(video_id: &str, operation: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn log_start(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    /// Log a failed attempt that will be retried or end the run.
    pub fn log_attempt_failed(&self, attempt: u32, max_attempts: u32, stage: &str, reason: &str) {
        warn!(
            video_id = %self.video_id,
            operation = %self.operation,
            attempt,
            max_attempts,
            stage,
            "Attempt failed: {}", reason
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }
}
