//! Server test utilities.

use loft_core::config::{AdminConfig, AppConfig, MetadataConfig, ServerConfig, StorageConfig};
use loft_metadata::models::TokenRow;
use loft_metadata::{MetadataStore, SqliteStore};
use loft_server::{AppState, create_router};
use loft_storage::{BlobStore, FilesystemBackend};
use std::sync::Arc;
use tempfile::TempDir;
use time::OffsetDateTime;
use uuid::Uuid;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage.
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let storage_path = temp_dir.path().join("blobs");
        let storage: Arc<dyn BlobStore> = Arc::new(
            FilesystemBackend::new(&storage_path)
                .await
                .expect("Failed to create storage backend"),
        );

        let db_path = temp_dir.path().join("metadata.db");
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(&db_path, None)
                .await
                .expect("Failed to create metadata store"),
        );

        let config = AppConfig {
            server: ServerConfig::default(),
            storage: StorageConfig::Filesystem { path: storage_path },
            metadata: MetadataConfig::Sqlite {
                path: db_path,
                query_timeout_secs: None,
            },
            admin: AdminConfig::for_testing(),
        };

        let state = AppState::new(config, storage, metadata);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata store.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// Get access to the underlying blob storage.
    pub fn storage(&self) -> Arc<dyn BlobStore> {
        self.state.storage.clone()
    }

    /// Create a token with the given scopes (JSON array string) and return
    /// the raw secret.
    pub async fn create_test_token(&self, scopes: &str) -> String {
        let raw_token = format!("test-token-{}", Uuid::new_v4());
        let token_hash = super::fixtures::sha256_hash(raw_token.as_bytes());

        let token = TokenRow {
            token_id: Uuid::new_v4(),
            token_hash,
            scopes: scopes.to_string(),
            expires_at: None,
            revoked_at: None,
            created_at: OffsetDateTime::now_utc(),
            last_used_at: None,
            description: Some("Test Token".to_string()),
        };

        self.metadata()
            .create_token(&token)
            .await
            .expect("Failed to create token");

        raw_token
    }
}
