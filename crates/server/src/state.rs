//! Application state shared across handlers.

use loft_core::config::AppConfig;
use loft_metadata::MetadataStore;
use loft_storage::BlobStore;
use std::sync::Arc;

/// Shared application state.
///
/// One long-lived store handle for the server's lifetime, explicitly
/// constructed at startup and passed to request handlers; the durable
/// records survive process restarts.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Content-addressed blob storage.
    pub storage: Arc<dyn BlobStore>,
    /// Durable documentation store.
    pub metadata: Arc<dyn MetadataStore>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            metadata,
        }
    }
}
