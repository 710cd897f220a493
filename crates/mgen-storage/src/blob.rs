//! Blob store abstraction.

use std::path::Path;

use async_trait::async_trait;

use mgen_models::VideoId;

use crate::error::StorageResult;

/// Uploads files and hands back a URL clients can fetch them from.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload the file at `path` under `key`; returns its public URL.
    async fn upload(&self, path: &Path, key: &str) -> StorageResult<String>;

    /// Remove the object stored under `key`.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Public URL for `key`, whether or not it has been uploaded.
    fn public_url(&self, key: &str) -> String;
}

/// Object key for a video's artifact.
pub fn video_key(video_id: &VideoId) -> String {
    format!("videos/{}.mp4", video_id)
}

/// Content type from a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("gif") => "image/gif",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

/// Keys must be relative and free of `..` segments.
pub(crate) fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('/') && !key.split('/').any(|s| s == ".." || s.is_empty())
}
