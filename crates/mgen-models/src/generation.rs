//! Generation request and generated script models.

use serde::{Deserialize, Serialize};

/// One pending call into the code generator.
///
/// Lives for a single recovery-loop invocation and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The caller's prompt, verbatim
    pub prompt: String,
    /// Zero-based attempt index within the current budget
    pub attempt: u32,
    /// Failure text from the previous attempt, fed back to the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl GenerationRequest {
    /// Create a first-attempt request.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            attempt: 0,
            last_error: None,
        }
    }

    /// Derive the follow-up request carrying the failure reason.
    pub fn regenerate(&self, error: impl Into<String>) -> Self {
        Self {
            prompt: self.prompt.clone(),
            attempt: self.attempt + 1,
            last_error: Some(error.into()),
        }
    }

    /// Whether this is a regeneration (has feedback attached).
    pub fn is_regeneration(&self) -> bool {
        self.last_error.is_some()
    }
}

/// A syntactically valid scene script together with its entry scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSource {
    /// Full script text
    pub text: String,
    /// Name of the first scene-like class in `text`
    pub entry_scene: String,
}

impl GeneratedSource {
    pub fn new(text: impl Into<String>, entry_scene: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entry_scene: entry_scene.into(),
        }
    }
}
