//! Axum HTTP API server.
//!
//! This crate provides:
//! - Account registration and login with HS256 access tokens
//! - Video generation endpoints backed by the worker pipeline
//! - Artifact delivery through blob-store redirects or local files
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use auth::{AuthUser, JwtKeys};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
