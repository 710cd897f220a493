//! Artifact location.
//!
//! The renderer's own path convention is tried first; otherwise a list of
//! candidate directories is searched recursively and the most recently
//! modified video wins.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;
use tracing::debug;

use crate::config::RenderConfig;
use crate::error::RenderResult;

/// Renderer folder holding per-segment fragments; never a final artifact.
const PARTIAL_FRAGMENTS_DIR: &str = "partial_movie_files";

/// Path the renderer writes to by convention:
/// `{output_dir}/media/videos/{script_stem}/{quality_folder}/{scene}.{format}`.
pub fn expected_artifact_path(config: &RenderConfig, output_dir: &Path, scene: &str) -> PathBuf {
    output_dir
        .join("media")
        .join("videos")
        .join(config.script_stem())
        .join(config.quality.folder())
        .join(format!("{}.{}", scene, config.format))
}

/// Deterministic destination for the final artifact.
pub fn final_artifact_path(config: &RenderConfig, output_dir: &Path, scene: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", scene, config.format))
}

/// Directories to search, highest priority first.
pub fn candidate_dirs(config: &RenderConfig, output_dir: &Path) -> Vec<PathBuf> {
    let media = output_dir.join("media");
    let mut dirs = vec![
        media.join("videos").join(config.script_stem()),
        media,
    ];

    if config.search_working_dir {
        if let Ok(cwd) = std::env::current_dir() {
            dirs.push(cwd.join("media").join("videos"));
        }
    }

    dirs.push(output_dir.to_path_buf());
    dirs
}

/// Whether a file modified at `modified` may belong to a run started at `not_before`.
fn is_fresh(modified: SystemTime, not_before: Option<SystemTime>) -> bool {
    not_before.map_or(true, |t| modified >= t)
}

/// Search `dirs` in order for files with extension `ext`.
///
/// Returns the newest file from the first directory that has any, skipping
/// renderer fragments, `exclude`, and files last modified before `not_before`.
pub async fn find_newest_artifact(
    dirs: &[PathBuf],
    ext: &str,
    exclude: &Path,
    not_before: Option<SystemTime>,
) -> RenderResult<Option<PathBuf>> {
    for dir in dirs {
        if !fs::try_exists(dir).await.unwrap_or(false) {
            continue;
        }

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        let mut pending = vec![dir.clone()];

        while let Some(current) = pending.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("Skipping unreadable directory {}: {}", current.display(), e);
                    continue;
                }
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    if path.file_name() != Some(OsStr::new(PARTIAL_FRAGMENTS_DIR)) {
                        pending.push(path);
                    }
                    continue;
                }

                if path.extension() != Some(OsStr::new(ext)) || path == exclude {
                    continue;
                }

                let modified = entry
                    .metadata()
                    .await?
                    .modified()
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                if !is_fresh(modified, not_before) {
                    debug!("Ignoring stale artifact {}", path.display());
                    continue;
                }
                if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
                    newest = Some((modified, path));
                }
            }
        }

        if let Some((_, path)) = newest {
            debug!("Located artifact {} under {}", path.display(), dir.display());
            return Ok(Some(path));
        }
    }

    Ok(None)
}

/// Find the artifact for `scene` written by a render started at `not_before`:
/// the conventional path if it exists, else the newest video in the
/// candidate directories.
pub async fn locate_artifact(
    config: &RenderConfig,
    output_dir: &Path,
    scene: &str,
    not_before: Option<SystemTime>,
) -> RenderResult<Option<PathBuf>> {
    let expected = expected_artifact_path(config, output_dir, scene);
    if let Ok(meta) = fs::metadata(&expected).await {
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if meta.is_file() && is_fresh(modified, not_before) {
            return Ok(Some(expected));
        }
    }

    let exclude = final_artifact_path(config, output_dir, scene);
    find_newest_artifact(
        &candidate_dirs(config, output_dir),
        &config.format,
        &exclude,
        not_before,
    )
    .await
}
