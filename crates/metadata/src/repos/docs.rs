//! Documentation repository.

use crate::error::MetadataResult;
use crate::models::DocRow;
use async_trait::async_trait;
use loft_core::PackageId;

/// Repository for the package → documentation archive association.
#[async_trait]
pub trait DocRepo: Send + Sync {
    /// Get the current association for a package, if any. No side effects.
    async fn lookup_docs(&self, package: &PackageId) -> MetadataResult<Option<DocRow>>;

    /// Existence check; semantically `lookup_docs(package).is_some()`.
    async fn has_docs(&self, package: &PackageId) -> MetadataResult<bool>;

    /// Atomically set the association for the row's package, replacing and
    /// discarding any prior association.
    ///
    /// The prior blob is not deleted from the blob store: orphan retention
    /// is deliberate for a shared content-addressed store. The change is
    /// durable before this returns.
    async fn insert_or_replace_docs(&self, row: &DocRow) -> MetadataResult<()>;

    /// Full read of the aggregate, for export and comparison.
    async fn snapshot_docs(&self) -> MetadataResult<Vec<DocRow>>;

    /// Replace the entire aggregate in one transaction. Restore only.
    async fn replace_all_docs(&self, rows: &[DocRow]) -> MetadataResult<()>;
}
