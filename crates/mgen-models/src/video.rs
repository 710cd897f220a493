//! Video record models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::user::UserId;

/// Unique identifier for a generated video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Video generation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Accepted, waiting for a worker slot
    #[default]
    Pending,
    /// Generation/rendering in progress
    Processing,
    /// Artifact rendered
    Completed,
    /// Retry budget exhausted or generation failed
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Processing => "processing",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        }
    }

    /// Whether the pipeline has finished with this record.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Failed)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted video generation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoRecord {
    /// Unique video ID
    pub id: VideoId,

    /// Owner
    pub user_id: UserId,

    /// Prompt as submitted
    pub prompt: String,

    /// Final scene script (the regenerated one if the loop rewrote it)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Local artifact path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_path: Option<String>,

    /// Public blob-store URL, when uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_url: Option<String>,

    /// Status
    #[serde(default)]
    pub status: VideoStatus,

    /// Last failure reason (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Render attempts consumed by the recovery loop
    #[serde(default)]
    pub attempts: u32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Create a new record.
    pub fn new(user_id: UserId, prompt: impl Into<String>, status: VideoStatus) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            user_id,
            prompt: prompt.into(),
            code: None,
            video_path: None,
            blob_url: None,
            status,
            error_message: None,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update and bump `updated_at`.
    pub fn apply(&mut self, update: VideoUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(code) = update.code {
            self.code = Some(code);
        }
        if let Some(path) = update.video_path {
            self.video_path = Some(path);
        }
        if let Some(url) = update.blob_url {
            self.blob_url = Some(url);
        }
        if let Some(message) = update.error_message {
            self.error_message = Some(message);
        }
        if let Some(attempts) = update.attempts {
            self.attempts = attempts;
        }
        self.updated_at = Utc::now();
    }

    /// Whether `user_id` owns this record.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }
}

/// Partial update of a video record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoUpdate {
    pub status: Option<VideoStatus>,
    pub code: Option<String>,
    pub video_path: Option<String>,
    pub blob_url: Option<String>,
    pub error_message: Option<String>,
    pub attempts: Option<u32>,
}

impl VideoUpdate {
    pub fn status(status: VideoStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_video_path(mut self, path: impl Into<String>) -> Self {
        self.video_path = Some(path.into());
        self
    }

    pub fn with_blob_url(mut self, url: impl Into<String>) -> Self {
        self.blob_url = Some(url.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }
}

/// One-based pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl Page {
    /// Maximum page size accepted from callers.
    pub const MAX_PER_PAGE: u32 = 100;

    /// Build a page, clamping out-of-range values.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    /// Number of records to skip.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.per_page as usize
    }
}
