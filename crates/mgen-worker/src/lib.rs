//! Generate-render-recover pipeline.
//!
//! This crate provides:
//! - The [`RecoveryLoop`] that drives generation, static checks and rendering
//!   within a bounded attempt budget
//! - The [`VideoProcessor`] that wraps the loop with record lifecycle,
//!   blob upload and admission control
//! - Worker configuration and structured job logging

pub mod config;
pub mod error;
pub mod logging;
pub mod processor;
pub mod recovery;

#[cfg(test)]
pub(crate) mod testing;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::{init_tracing, JobLogger};
pub use processor::VideoProcessor;
pub use recovery::{LoopRun, ProducedVideo, RecoveryLoop};
