//! Blob store trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use loft_core::BlobId;
use std::path::PathBuf;
use std::pin::Pin;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Metadata about a stored blob.
#[derive(Clone, Debug)]
pub struct BlobMeta {
    /// Blob size in bytes.
    pub size: u64,
    /// Last modification time (if available).
    pub last_modified: Option<time::OffsetDateTime>,
}

/// Content-addressed store of immutable byte payloads.
///
/// Blobs are keyed by their content-derived [`BlobId`]; one id never names
/// two different payloads, so concurrent writers of the same content are
/// harmless. Payloads are immutable once added and there is no delete:
/// orphaned blobs are retained deliberately since the store is shared.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Persist a payload and return its content-derived id.
    ///
    /// The blob is durable (flushed and atomically in place) before this
    /// returns. Adding already-present content is a no-op.
    async fn add(&self, data: Bytes) -> StorageResult<BlobId>;

    /// Check if a blob exists.
    async fn exists(&self, blob: &BlobId) -> StorageResult<bool>;

    /// Get a blob's size without fetching content.
    async fn meta(&self, blob: &BlobId) -> StorageResult<BlobMeta>;

    /// Get a blob's full content.
    async fn fetch(&self, blob: &BlobId) -> StorageResult<Bytes>;

    /// Get a blob as a byte stream.
    async fn fetch_stream(&self, blob: &BlobId) -> StorageResult<ByteStream>;

    /// Read `len` bytes starting at `offset`.
    async fn read_range(&self, blob: &BlobId, offset: u64, len: u64) -> StorageResult<Bytes>;

    /// Stream `len` bytes starting at `offset` in chunks.
    async fn read_range_stream(
        &self,
        blob: &BlobId,
        offset: u64,
        len: u64,
    ) -> StorageResult<ByteStream>;

    /// Stable filesystem location of a blob.
    ///
    /// The path is where the blob lives (or would live) on disk; it is
    /// valid whether or not the blob currently exists.
    fn blob_path(&self, blob: &BlobId) -> PathBuf;

    /// Get the name of this storage backend, for metrics and logging.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend health. Called during server startup before
    /// accepting requests.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
