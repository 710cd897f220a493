//! Worker configuration.

use std::path::PathBuf;

use mgen_models::TargetProfile;

use crate::error::WorkerResult;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root under which each video gets `{videos_dir}/{video_id}`
    pub videos_dir: PathBuf,
    /// Render attempts per video
    pub max_retries: u32,
    /// Maximum concurrent pipeline runs
    pub max_concurrent_jobs: usize,
    /// Remove the renderer's `media/` tree after a terminal result
    pub cleanup_scratch: bool,
    /// JSON target profile replacing the built-in one
    pub target_profile_path: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            videos_dir: PathBuf::from("videos"),
            max_retries: 3,
            max_concurrent_jobs: 2,
            cleanup_scratch: false,
            target_profile_path: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            videos_dir: std::env::var("VIDEOS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("videos")),
            max_retries: std::env::var("PIPELINE_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(2),
            cleanup_scratch: std::env::var("CLEANUP_SCRATCH")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            target_profile_path: std::env::var("TARGET_PROFILE_PATH").ok().map(PathBuf::from),
        }
    }

    /// The configured target profile, or the built-in default.
    pub fn load_profile(&self) -> WorkerResult<TargetProfile> {
        match &self.target_profile_path {
            Some(path) => Ok(TargetProfile::from_json_file(path)?),
            None => Ok(TargetProfile::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = WorkerConfig::default().load_profile().unwrap();
        assert_eq!(profile, TargetProfile::manim_community());
    }

    #[test]
    fn test_missing_profile_file() {
        let config = WorkerConfig {
            target_profile_path: Some(PathBuf::from("/nonexistent/profile.json")),
            ..Default::default()
        };
        assert!(config.load_profile().is_err());
    }
}
