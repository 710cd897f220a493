//! Target animation-API profile.
//!
//! One profile describes the scripting API the generator targets: how a
//! script imports the library, which base classes make a class renderable,
//! and which deprecated symbols must never reach the renderer.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors loading a profile from disk.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid profile JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid profile: {0}")]
    Invalid(String),
}

/// A deprecated symbol and the hint pointing at its replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannedSymbol {
    /// Substring that must not appear in a script
    pub symbol: String,
    /// Replacement the model should use instead
    pub replacement: String,
    /// Human-readable reason, reported by the static issue detector
    pub hint: String,
}

impl BannedSymbol {
    pub fn new(
        symbol: impl Into<String>,
        replacement: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            replacement: replacement.into(),
            hint: hint.into(),
        }
    }
}

/// Scripting API the pipeline generates code for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetProfile {
    /// Profile name for logging
    pub name: String,
    /// Library description used in the system prompt
    pub library: String,
    /// Import line injected when a script has none
    pub default_import: String,
    /// Prefixes that count as "the script already imports the library"
    pub import_markers: Vec<String>,
    /// Base classes that make a class a renderable scene
    pub scene_base_types: Vec<String>,
    /// Also accept any base class whose name ends with `Scene`
    #[serde(default = "default_true")]
    pub accept_scene_suffix: bool,
    /// Method every scene must implement
    pub build_method: String,
    /// Deprecated symbols, checked in order
    pub banned_symbols: Vec<BannedSymbol>,
    /// Extra bullet points for the system prompt
    #[serde(default)]
    pub guidance: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for TargetProfile {
    fn default() -> Self {
        Self::manim_community()
    }
}

impl TargetProfile {
    /// ManimCommunity profile, matching the `manim` renderer CLI.
    pub fn manim_community() -> Self {
        Self {
            name: "manim-community".to_string(),
            library: "the ManimCommunity `manim` Python library".to_string(),
            default_import: "from manim import *".to_string(),
            import_markers: vec![
                "from manim import".to_string(),
                "import manim".to_string(),
                "from manimlib import".to_string(),
            ],
            scene_base_types: vec![
                "Scene".to_string(),
                "ThreeDScene".to_string(),
                "MovingCameraScene".to_string(),
                "ZoomedScene".to_string(),
                "VectorScene".to_string(),
                "LinearTransformationScene".to_string(),
            ],
            accept_scene_suffix: true,
            build_method: "construct".to_string(),
            banned_symbols: vec![
                BannedSymbol::new(
                    "ShowCreation",
                    "Create()",
                    "ShowCreation is deprecated. Use Create() instead.",
                ),
                BannedSymbol::new(
                    "TextMobject",
                    "Text()",
                    "TextMobject is deprecated. Use Text() instead.",
                ),
                BannedSymbol::new(
                    "TexMobject",
                    "MathTex()",
                    "TexMobject is deprecated. Use MathTex() instead.",
                ),
            ],
            guidance: vec![
                "Use Write() for text animations".to_string(),
                "Use FadeIn() and FadeOut() for fade animations".to_string(),
                "Make sure every animation and object you use is imported".to_string(),
            ],
        }
    }

    /// Load a profile from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let raw = std::fs::read_to_string(path)?;
        let profile: Self = serde_json::from_str(&raw)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reject profiles that could never recognise a scene.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.scene_base_types.is_empty() && !self.accept_scene_suffix {
            return Err(ProfileError::Invalid(
                "profile recognises no scene base types".to_string(),
            ));
        }
        if self.default_import.trim().is_empty() {
            return Err(ProfileError::Invalid("default_import is empty".to_string()));
        }
        if self.build_method.trim().is_empty() {
            return Err(ProfileError::Invalid("build_method is empty".to_string()));
        }
        Ok(())
    }

    /// Whether `base` (possibly module-qualified, e.g. `manim.Scene`) is a scene base class.
    pub fn is_scene_base(&self, base: &str) -> bool {
        let name = base.rsplit('.').next().unwrap_or(base).trim();
        if name.is_empty() {
            return false;
        }
        self.scene_base_types.iter().any(|t| t == name)
            || (self.accept_scene_suffix && name.ends_with("Scene"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_scene_base_matching() {
        let profile = TargetProfile::manim_community();
        assert!(profile.is_scene_base("Scene"));
        assert!(profile.is_scene_base("manim.ThreeDScene"));
        assert!(profile.is_scene_base("MyCustomScene"));
        assert!(!profile.is_scene_base("VGroup"));
        assert!(!profile.is_scene_base(""));

        let strict = TargetProfile {
            accept_scene_suffix: false,
            ..TargetProfile::manim_community()
        };
        assert!(!strict.is_scene_base("MyCustomScene"));
        assert!(strict.is_scene_base("MovingCameraScene"));
    }

    #[test]
    fn test_load_from_json_file() {
        let mut profile = TargetProfile::manim_community();
        profile.name = "custom".to_string();
        profile.banned_symbols.truncate(1);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&profile).unwrap().as_bytes())
            .unwrap();

        let loaded = TargetProfile::from_json_file(file.path()).unwrap();
        assert_eq!(loaded.name, "custom");
        assert_eq!(loaded.banned_symbols.len(), 1);
    }

    #[test]
    fn test_validate_rejects_unusable_profile() {
        let profile = TargetProfile {
            scene_base_types: Vec::new(),
            accept_scene_suffix: false,
            ..TargetProfile::manim_community()
        };
        assert!(matches!(profile.validate(), Err(ProfileError::Invalid(_))));
    }
}
