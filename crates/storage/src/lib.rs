//! Content-addressed blob storage for Loft.
//!
//! This crate provides:
//! - The [`BlobStore`] trait: content-addressed `add`, fetch, streaming and
//!   ranged reads, and a stable on-disk path per blob
//! - A local filesystem backend with atomic writes

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use error::{StorageError, StorageResult};
pub use traits::{BlobMeta, BlobStore, ByteStream};

use loft_core::config::StorageConfig;
use std::sync::Arc;

/// Create a blob store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn BlobStore>> {
    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::tempdir;

    #[tokio::test]
    async fn from_config_filesystem_ok() {
        let temp = tempdir().unwrap();
        let config = StorageConfig::Filesystem {
            path: temp.path().join("store"),
        };

        let store = from_config(&config).await.unwrap();
        let blob = store.add(Bytes::from_static(b"hi")).await.unwrap();
        assert!(store.exists(&blob).await.unwrap());
    }
}
