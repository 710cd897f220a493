//! Shared data models for the MGen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Generation requests and generated scene scripts
//! - Render outcomes and failure categories
//! - The target animation-API profile
//! - Video records and users

pub mod generation;
pub mod outcome;
pub mod profile;
pub mod user;
pub mod video;

// Re-export common types
pub use generation::{GeneratedSource, GenerationRequest};
pub use outcome::{FatalKind, ReasonCategory, RenderOutcome};
pub use profile::{BannedSymbol, ProfileError, TargetProfile};
pub use user::{User, UserId};
pub use video::{Page, VideoId, VideoRecord, VideoStatus, VideoUpdate};
