//! Scene-script generation.
//!
//! This crate provides:
//! - A generative-text client abstraction plus an OpenAI-compatible HTTP client
//! - Prompt construction for the target animation API
//! - Response sanitizing (code fences, missing imports)
//! - A retrying code generator that only returns syntactically valid scripts
//! - A static issue detector for deprecated API usage

pub mod checker;
pub mod client;
pub mod config;
pub mod error;
pub mod generator;
pub mod prompt;
pub mod sanitize;

pub use checker::{StaticCheck, StaticIssueDetector};
pub use client::{CompletionRequest, OpenAiClient, TextGenerator};
pub use config::CodegenConfig;
pub use error::{CodegenError, CodegenResult};
pub use generator::{CodeGenerator, ScriptSource};
