//! Filesystem helpers for render output.
//!
//! The renderer may run as a different user than the service, so output
//! directories are opened up to 0o777 and artifacts to 0o666. Failing to
//! relax permissions is logged, never fatal.

use std::path::Path;
use tokio::fs;

use crate::error::RenderResult;

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await {
        tracing::warn!(
            "Failed to set permissions {:o} on {}: {}",
            mode,
            path.display(),
            e
        );
    }
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) {}

/// Create `dir` (and parents) and make it writable by everyone.
pub async fn ensure_open_dir(dir: &Path) -> RenderResult<()> {
    fs::create_dir_all(dir).await?;
    set_mode(dir, 0o777).await;
    Ok(())
}

/// Make a file readable and writable by everyone.
pub async fn relax_file_permissions(path: &Path) {
    set_mode(path, 0o666).await;
}

/// Copy `src` to `dst`, relax its permissions, and return the copied size.
pub async fn copy_artifact(src: &Path, dst: &Path) -> RenderResult<u64> {
    if src != dst {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(src, dst).await.map_err(|e| {
            tracing::error!(
                "Failed to copy artifact: {} -> {}: {}",
                src.display(),
                dst.display(),
                e
            );
            e
        })?;
    }

    relax_file_permissions(dst).await;
    Ok(fs::metadata(dst).await?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copy_artifact_reports_size() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("media").join("Scene.mp4");
        fs::create_dir_all(src.parent().unwrap()).await.unwrap();
        fs::write(&src, b"video bytes").await.unwrap();

        let dst = dir.path().join("Scene.mp4");
        let size = copy_artifact(&src, &dst).await.unwrap();

        assert_eq!(size, 11);
        assert!(src.exists(), "source is kept");
        assert_eq!(fs::read(&dst).await.unwrap(), b"video bytes");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ensure_open_dir_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("a").join("b");
        ensure_open_dir(&out).await.unwrap();

        let mode = fs::metadata(&out).await.unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o777);
    }
}
