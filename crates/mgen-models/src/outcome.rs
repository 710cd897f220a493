//! Render outcome contract between the render executor and the recovery loop.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Category assigned to a classified renderer failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCategory {
    /// `NameError: name '...' is not defined`
    UndefinedName,
    /// `AttributeError: ...`
    AttributeError,
    /// `ImportError` / `ModuleNotFoundError`
    ImportError,
    /// Renderer error that no table entry recognised
    Unclassified,
}

impl ReasonCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCategory::UndefinedName => "undefined_name",
            ReasonCategory::AttributeError => "attribute_error",
            ReasonCategory::ImportError => "import_error",
            ReasonCategory::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for ReasonCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structural reason behind a fatal render failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalKind {
    /// Script declares no scene-like class
    NoEntryScene,
    /// Renderer exited non-zero with an unrecognised error
    RendererFailed,
    /// Renderer exceeded the configured time bound
    TimedOut,
    /// Renderer exited zero but no video file could be found
    ArtifactNotLocated,
    /// Copying the artifact produced an empty file
    EmptyArtifact,
}

impl FatalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FatalKind::NoEntryScene => "no_entry_scene",
            FatalKind::RendererFailed => "renderer_failed",
            FatalKind::TimedOut => "timed_out",
            FatalKind::ArtifactNotLocated => "artifact_not_located",
            FatalKind::EmptyArtifact => "empty_artifact",
        }
    }
}

impl fmt::Display for FatalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one render attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RenderOutcome {
    /// Artifact copied to its deterministic path
    Success { artifact_path: PathBuf },
    /// Known generation-fixable failure
    RetryableFailure {
        category: ReasonCategory,
        message: String,
    },
    /// Unrecognised or structural failure
    FatalFailure { kind: FatalKind, message: String },
}

impl RenderOutcome {
    pub fn success(artifact_path: impl Into<PathBuf>) -> Self {
        Self::Success {
            artifact_path: artifact_path.into(),
        }
    }

    pub fn retryable(category: ReasonCategory, message: impl Into<String>) -> Self {
        Self::RetryableFailure {
            category,
            message: message.into(),
        }
    }

    pub fn fatal(kind: FatalKind, message: impl Into<String>) -> Self {
        Self::FatalFailure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RenderOutcome::Success { .. })
    }

    /// Failure text to feed back into regeneration, if this is a failure.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            RenderOutcome::Success { .. } => None,
            RenderOutcome::RetryableFailure { message, .. }
            | RenderOutcome::FatalFailure { message, .. } => Some(message),
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RenderOutcome::Success { .. } => "success",
            RenderOutcome::RetryableFailure { category, .. } => category.as_str(),
            RenderOutcome::FatalFailure { kind, .. } => kind.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason() {
        let ok = RenderOutcome::success("/tmp/out/Circle.mp4");
        assert!(ok.is_success());
        assert_eq!(ok.failure_reason(), None);

        let retry = RenderOutcome::retryable(
            ReasonCategory::UndefinedName,
            "NameError: name 'Foo' is not defined",
        );
        assert_eq!(
            retry.failure_reason(),
            Some("NameError: name 'Foo' is not defined")
        );
        assert_eq!(retry.label(), "undefined_name");

        let fatal = RenderOutcome::fatal(FatalKind::ArtifactNotLocated, "artifact not located");
        assert_eq!(fatal.label(), "artifact_not_located");
    }

    #[test]
    fn test_serde_tagging() {
        let outcome = RenderOutcome::fatal(FatalKind::NoEntryScene, "no scene");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "fatal_failure");
        assert_eq!(json["kind"], "no_entry_scene");
    }
}
