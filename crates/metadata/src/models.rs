//! Database models mapping to the metadata schema.

use loft_core::{BlobId, PackageId, TarIndex};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Documentation record: the current archive association for one package.
///
/// The stored tar index is always the index of the archive named by
/// `blob_id`; the single insert-or-replace write path keeps the pair
/// consistent. For snapshot comparison only `blob_id` is canonical; the
/// index is derived and rebuilt on restore.
#[derive(Debug, Clone, FromRow)]
pub struct DocRow {
    pub package_name: String,
    pub package_version: String,
    /// Hex blob id of the archive in the blob store.
    pub blob_id: String,
    /// Serialized [`TarIndex`] (JSON).
    pub tar_index: String,
    /// Archive size in bytes.
    pub archive_size: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl DocRow {
    /// Build a row from a freshly derived (blob, index) pair.
    pub fn new(
        package: &PackageId,
        blob: &BlobId,
        index: &TarIndex,
        archive_size: u64,
        now: OffsetDateTime,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            package_name: package.name().to_string(),
            package_version: package.version().to_string(),
            blob_id: blob.to_hex(),
            tar_index: serde_json::to_string(index)?,
            archive_size: archive_size as i64,
            created_at: now,
            updated_at: now,
        })
    }

    /// The package this row belongs to.
    pub fn package_id(&self) -> loft_core::Result<PackageId> {
        PackageId::new(&self.package_name, &self.package_version)
    }

    /// Decode the stored blob id.
    pub fn blob(&self) -> loft_core::Result<BlobId> {
        BlobId::from_hex(&self.blob_id)
    }

    /// Decode the stored tar index.
    pub fn index(&self) -> Result<TarIndex, serde_json::Error> {
        serde_json::from_str(&self.tar_index)
    }
}

/// Token record.
#[derive(Debug, Clone, FromRow)]
pub struct TokenRow {
    pub token_id: Uuid,
    pub token_hash: String,
    pub scopes: String, // JSON array
    pub expires_at: Option<OffsetDateTime>,
    pub revoked_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub last_used_at: Option<OffsetDateTime>,
    pub description: Option<String>,
}
