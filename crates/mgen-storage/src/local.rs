//! Local-directory blob store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use crate::blob::{is_valid_key, BlobStore};
use crate::error::{StorageError, StorageResult};

/// Copies objects under a root directory and serves them from `base_url`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Filesystem path an object is stored at.
    pub fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, path: &Path, key: &str) -> StorageResult<String> {
        if !is_valid_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Err(StorageError::not_found(path.display().to_string()));
        }

        let dest = self.object_path(key);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(path, &dest).await?;

        info!("Stored {} as {}", path.display(), key);
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        if !is_valid_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        match fs::remove_file(self.object_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::not_found(key)),
            Err(e) => Err(StorageError::delete_failed(e.to_string())),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upload_and_delete() {
        let src_dir = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let src = src_dir.path().join("Scene.mp4");
        fs::write(&src, b"video").await.unwrap();

        let store = LocalBlobStore::new(root.path(), "http://localhost:8000/blobs/");
        let url = store.upload(&src, "videos/abc.mp4").await.unwrap();

        assert_eq!(url, "http://localhost:8000/blobs/videos/abc.mp4");
        assert_eq!(
            fs::read(store.object_path("videos/abc.mp4")).await.unwrap(),
            b"video"
        );

        store.delete("videos/abc.mp4").await.unwrap();
        assert!(matches!(
            store.delete("videos/abc.mp4").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_source() {
        let root = TempDir::new().unwrap();
        let store = LocalBlobStore::new(root.path(), "http://x");
        let err = store
            .upload(Path::new("/nonexistent.mp4"), "videos/a.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
