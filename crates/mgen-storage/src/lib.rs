//! Blob storage for rendered videos.
//!
//! This crate provides:
//! - The [`BlobStore`] trait used by the pipeline and the API
//! - A Cloudflare R2 implementation
//! - A local-directory implementation for development and tests

pub mod blob;
pub mod client;
pub mod error;
pub mod local;

pub use blob::{content_type_for, video_key, BlobStore};
pub use client::{R2BlobStore, R2Config};
pub use error::{StorageError, StorageResult};
pub use local::LocalBlobStore;
