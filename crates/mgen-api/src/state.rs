//! Application state.

use std::sync::Arc;

use tracing::{info, warn};

use mgen_codegen::CodegenConfig;
use mgen_render::RenderConfig;
use mgen_storage::{BlobStore, R2BlobStore};
use mgen_store::{AccountStore, InMemoryAccountStore, InMemoryVideoStore, VideoRecordStore};
use mgen_worker::{RecoveryLoop, VideoProcessor, WorkerConfig};

use crate::auth::JwtKeys;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub jwt: JwtKeys,
    pub accounts: Arc<dyn AccountStore>,
    pub videos: Arc<dyn VideoRecordStore>,
    pub processor: Arc<VideoProcessor>,
}

impl AppState {
    /// Assemble state from already-built collaborators.
    pub fn new(
        config: ApiConfig,
        accounts: Arc<dyn AccountStore>,
        videos: Arc<dyn VideoRecordStore>,
        processor: Arc<VideoProcessor>,
    ) -> Self {
        let jwt = JwtKeys::new(&config.jwt_secret, config.jwt_ttl);
        Self {
            config,
            jwt,
            accounts,
            videos,
            processor,
        }
    }

    /// Create application state from environment configuration.
    pub fn from_env(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let worker = WorkerConfig::from_env();
        let profile = worker.load_profile()?;
        let codegen = CodegenConfig::from_env()?;
        let recovery = RecoveryLoop::from_config(codegen, RenderConfig::from_env(), profile)?;

        let blobs: Option<Arc<dyn BlobStore>> = match R2BlobStore::from_env() {
            Ok(store) => {
                info!("Uploading rendered videos to bucket {}", store.bucket());
                Some(Arc::new(store))
            }
            Err(e) => {
                warn!("Blob storage not configured ({}); serving videos from local disk", e);
                None
            }
        };

        let accounts: Arc<dyn AccountStore> = Arc::new(InMemoryAccountStore::new());
        let videos: Arc<dyn VideoRecordStore> = Arc::new(InMemoryVideoStore::new());
        let processor = Arc::new(VideoProcessor::new(
            worker,
            Arc::new(recovery),
            Arc::clone(&videos),
            blobs,
        ));

        Ok(Self::new(config, accounts, videos, processor))
    }
}
