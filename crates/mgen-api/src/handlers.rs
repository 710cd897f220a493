//! Request handlers.

pub mod auth;
pub mod health;
pub mod videos;

pub use auth::*;
pub use health::*;
pub use videos::*;
