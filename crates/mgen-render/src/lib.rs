//! Scene rendering.
//!
//! This crate provides:
//! - A builder and runner for the external renderer subprocess
//! - Stderr failure classification against a configurable pattern table
//! - Artifact location (renderer path convention, then directory search)
//! - The [`RenderExecutor`] that turns a script into a [`RenderOutcome`]
//!
//! [`RenderOutcome`]: mgen_models::RenderOutcome

pub mod classifier;
pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod fs_utils;
pub mod locate;

pub use classifier::{Classification, ClassifierRule, FailureClassifier};
pub use command::{check_renderer, RenderCommand, RenderRun, RenderRunner};
pub use config::{RenderConfig, RenderQuality};
pub use error::{RenderError, RenderResult};
pub use executor::{RenderExecutor, Renderer};
