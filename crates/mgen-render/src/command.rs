//! Renderer command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::RenderQuality;
use crate::error::{RenderError, RenderResult};

/// Builder for renderer commands.
#[derive(Debug, Clone)]
pub struct RenderCommand {
    /// Renderer executable
    bin: String,
    /// Arguments before the script path
    leading_args: Vec<String>,
    /// Script file
    script: PathBuf,
    /// Scene class to render
    scene: String,
    /// Quality preset
    quality: RenderQuality,
    /// Output format flag
    format: String,
    /// Extra trailing arguments
    extra_args: Vec<String>,
    /// Working directory for the subprocess
    working_dir: Option<PathBuf>,
}

impl RenderCommand {
    /// Create a new render command.
    pub fn new(bin: impl Into<String>, script: impl AsRef<Path>, scene: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            leading_args: Vec::new(),
            script: script.as_ref().to_path_buf(),
            scene: scene.into(),
            quality: RenderQuality::default(),
            format: "mp4".to_string(),
            extra_args: Vec::new(),
            working_dir: None,
        }
    }

    /// Add arguments placed before the script path.
    pub fn leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set quality preset.
    pub fn quality(mut self, quality: RenderQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Set output format.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Add a trailing argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Run the renderer from `dir`.
    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.leading_args.clone();

        args.push(self.script.to_string_lossy().to_string());
        args.push(self.scene.clone());
        args.push(format!("-q{}", self.quality.flag()));
        args.push("--format".to_string());
        args.push(self.format.clone());
        args.extend(self.extra_args.clone());

        args
    }
}

/// Collected result of one renderer run.
#[derive(Debug, Clone)]
pub struct RenderRun {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runner for renderer commands with an optional timeout.
#[derive(Debug, Clone, Default)]
pub struct RenderRunner {
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl RenderRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run a render command, collecting stdout and stderr in full.
    pub async fn run(&self, cmd: &RenderCommand) -> RenderResult<RenderRun> {
        let bin = check_renderer(&cmd.bin)?;

        let args = cmd.build_args();
        debug!("Running renderer: {} {}", cmd.bin, args.join(" "));

        let mut command = Command::new(&bin);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &cmd.working_dir {
            command.current_dir(dir);
        }

        let child = command
            .spawn()
            .map_err(|e| RenderError::spawn_failed(format!("{}: {}", cmd.bin, e)))?;

        // Dropping the wait future drops the child, which kills it.
        let output = match self.timeout_secs {
            Some(secs) => {
                match tokio::time::timeout(Duration::from_secs(secs), child.wait_with_output())
                    .await
                {
                    Ok(result) => result?,
                    Err(_) => {
                        warn!("Renderer timed out after {} seconds, killing process", secs);
                        return Err(RenderError::Timeout(secs));
                    }
                }
            }
            None => child.wait_with_output().await?,
        };

        Ok(RenderRun {
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Check that the renderer binary is available.
pub fn check_renderer(bin: &str) -> RenderResult<PathBuf> {
    which::which(bin).map_err(|_| RenderError::renderer_not_found(bin))
}
