//! Local filesystem blob storage backend.

use crate::error::{StorageError, StorageResult};
use crate::traits::{BlobMeta, BlobStore, ByteStream};
use async_trait::async_trait;
use bytes::Bytes;
use loft_core::BlobId;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Default chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Maximum range size for read_range operations (128 MiB).
/// This prevents large memory allocations from user-controlled range requests.
const MAX_RANGE_SIZE: u64 = 128 * 1024 * 1024;

/// Local filesystem blob store.
///
/// Blobs live under `<root>/blobs/aa/bb/<hex id>`, sharded by the first two
/// hex byte pairs to keep directories small.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("blobs")).await?;
        Ok(Self { root })
    }

    fn path_for(&self, blob: &BlobId) -> PathBuf {
        let hex = blob.to_hex();
        self.root
            .join("blobs")
            .join(&hex[..2])
            .join(&hex[2..4])
            .join(hex)
    }

    async fn open(&self, blob: &BlobId) -> StorageResult<fs::File> {
        let path = self.path_for(blob);
        fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(blob.to_hex())
            } else {
                StorageError::Io(e)
            }
        })
    }

    fn validate_range(offset: u64, len: u64, blob_size: u64) -> StorageResult<usize> {
        if len > MAX_RANGE_SIZE {
            return Err(StorageError::InvalidRange(format!(
                "range size {len} exceeds maximum {MAX_RANGE_SIZE} bytes"
            )));
        }
        let end = offset.checked_add(len).ok_or_else(|| {
            StorageError::InvalidRange(format!("range overflows: offset {offset} + len {len}"))
        })?;
        if end > blob_size {
            return Err(StorageError::InvalidRange(format!(
                "range [{offset}, {end}) exceeds blob size {blob_size}"
            )));
        }
        usize::try_from(len).map_err(|_| {
            StorageError::InvalidRange(format!("range size {len} exceeds platform address space"))
        })
    }
}

#[async_trait]
impl BlobStore for FilesystemBackend {
    #[instrument(skip(self, data), fields(backend = "filesystem", size = data.len()))]
    async fn add(&self, data: Bytes) -> StorageResult<BlobId> {
        let blob = BlobId::compute(&data);
        let path = self.path_for(&blob);

        // Content-addressed: an existing blob with this id already holds
        // these bytes, so a hit skips the write entirely.
        if fs::try_exists(&path).await? {
            return Ok(blob);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a uniquely-named temp file, fsync, then rename for
        // atomicity and durability. Concurrent writers of the same content
        // race benignly: last rename wins with identical bytes.
        let temp_path = path.with_file_name(format!(".tmp.{}", Uuid::new_v4()));
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
        }
        fs::rename(&temp_path, &path).await?;

        Ok(blob)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn exists(&self, blob: &BlobId) -> StorageResult<bool> {
        fs::try_exists(self.path_for(blob))
            .await
            .map_err(StorageError::Io)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn meta(&self, blob: &BlobId) -> StorageResult<BlobMeta> {
        let path = self.path_for(blob);
        let metadata = fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(blob.to_hex())
            } else {
                StorageError::Io(e)
            }
        })?;

        Ok(BlobMeta {
            size: metadata.len(),
            last_modified: metadata.modified().ok().map(|t| t.into()),
        })
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn fetch(&self, blob: &BlobId) -> StorageResult<Bytes> {
        let path = self.path_for(blob);
        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(blob.to_hex())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn fetch_stream(&self, blob: &BlobId) -> StorageResult<ByteStream> {
        use tokio::io::AsyncReadExt;

        let file = self.open(blob).await?;

        // Stream the blob in chunks instead of loading it entirely.
        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn read_range(&self, blob: &BlobId, offset: u64, len: u64) -> StorageResult<Bytes> {
        use tokio::io::{AsyncReadExt, AsyncSeekExt};

        let meta = self.meta(blob).await?;
        let len = Self::validate_range(offset, len, meta.size)?;

        let mut file = self.open(blob).await?;
        file.seek(std::io::SeekFrom::Start(offset)).await?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf).await?;

        Ok(Bytes::from(buf))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn read_range_stream(
        &self,
        blob: &BlobId,
        offset: u64,
        len: u64,
    ) -> StorageResult<ByteStream> {
        use tokio::io::{AsyncReadExt, AsyncSeekExt};

        let meta = self.meta(blob).await?;
        let remaining = Self::validate_range(offset, len, meta.size)?;

        let mut file = self.open(blob).await?;
        file.seek(std::io::SeekFrom::Start(offset)).await?;

        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut remaining = remaining;
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            while remaining > 0 {
                let want = remaining.min(STREAM_CHUNK_SIZE);
                let n = file.read(&mut buf[..want]).await?;
                if n == 0 {
                    Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "blob shorter than its recorded range",
                    ))?;
                }
                remaining -= n;
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }

    fn blob_path(&self, blob: &BlobId) -> PathBuf {
        self.path_for(blob)
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("storage root not accessible: {e}"),
            ))
        })?;

        if !metadata.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("storage root is not a directory: {:?}", self.root),
            )));
        }

        Ok(())
    }
}
