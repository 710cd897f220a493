//! Account and video record stores.
//!
//! Traits for the two persistence collaborators of the pipeline, plus
//! in-memory implementations used by the API server and in tests.

pub mod accounts;
pub mod error;
pub mod password;
pub mod videos;

pub use accounts::{AccountStore, InMemoryAccountStore};
pub use error::{StoreError, StoreResult};
pub use videos::{InMemoryVideoStore, VideoListing, VideoRecordStore};
