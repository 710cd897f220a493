//! Renderer configuration.

use serde::{Deserialize, Serialize};

/// Renderer quality preset.
///
/// Each preset maps to a `-q` flag and to the folder name the renderer
/// writes its output under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderQuality {
    Low,
    #[default]
    Medium,
    High,
    Production,
    FourK,
}

impl RenderQuality {
    /// Parse a `-q` flag letter (`l`, `m`, `h`, `p`, `k`).
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Some(Self::Low),
            "m" | "medium" => Some(Self::Medium),
            "h" | "high" => Some(Self::High),
            "p" | "production" => Some(Self::Production),
            "k" | "4k" => Some(Self::FourK),
            _ => None,
        }
    }

    pub fn flag(&self) -> &'static str {
        match self {
            Self::Low => "l",
            Self::Medium => "m",
            Self::High => "h",
            Self::Production => "p",
            Self::FourK => "k",
        }
    }

    /// Output folder the renderer uses for this preset.
    pub fn folder(&self) -> &'static str {
        match self {
            Self::Low => "480p15",
            Self::Medium => "720p30",
            Self::High => "1080p60",
            Self::Production => "1440p60",
            Self::FourK => "2160p60",
        }
    }
}

/// Render executor configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Renderer executable (name on PATH or absolute path)
    pub renderer_bin: String,
    /// Arguments placed before the script path (e.g. `-m manim`)
    pub renderer_args: Vec<String>,
    /// Quality preset
    pub quality: RenderQuality,
    /// Output format, also the artifact extension
    pub format: String,
    /// Kill the renderer after this many seconds
    pub timeout_secs: Option<u64>,
    /// Scratch script written into the output directory
    pub script_name: String,
    /// Also search the service's `{cwd}/media/videos` for artifacts
    pub search_working_dir: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            renderer_bin: "manim".to_string(),
            renderer_args: Vec::new(),
            quality: RenderQuality::default(),
            format: "mp4".to_string(),
            timeout_secs: None,
            script_name: "animation.py".to_string(),
            search_working_dir: false,
        }
    }
}

impl RenderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            renderer_bin: std::env::var("RENDERER_BIN").unwrap_or(defaults.renderer_bin),
            renderer_args: std::env::var("RENDERER_ARGS")
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            quality: std::env::var("RENDER_QUALITY")
                .ok()
                .and_then(|s| RenderQuality::from_flag(&s))
                .unwrap_or(defaults.quality),
            format: std::env::var("RENDER_FORMAT").unwrap_or(defaults.format),
            timeout_secs: std::env::var("RENDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0),
            search_working_dir: std::env::var("RENDER_SEARCH_CWD")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.search_working_dir),
            ..defaults
        }
    }

    /// File stem of the scratch script; the renderer names its media folder after it.
    pub fn script_stem(&self) -> &str {
        self.script_name
            .strip_suffix(".py")
            .unwrap_or(&self.script_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_flags() {
        assert_eq!(RenderQuality::from_flag("m"), Some(RenderQuality::Medium));
        assert_eq!(RenderQuality::from_flag(" K "), Some(RenderQuality::FourK));
        assert_eq!(RenderQuality::from_flag("x"), None);
        assert_eq!(RenderQuality::Medium.flag(), "m");
        assert_eq!(RenderQuality::Medium.folder(), "720p30");
        assert_eq!(RenderQuality::Low.folder(), "480p15");
    }

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.renderer_bin, "manim");
        assert_eq!(config.format, "mp4");
        assert_eq!(config.script_stem(), "animation");
        assert!(config.timeout_secs.is_none());
        assert!(!config.search_working_dir);
    }
}
