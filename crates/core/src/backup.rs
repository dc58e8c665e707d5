//! Backup export record types.

use crate::{BlobId, PackageId};
use serde::{Deserialize, Serialize};

/// Fixed marker identifying documentation-archive records in a backup.
pub const ARCHIVE_MARKER: &str = "docs.tar";

/// One export record per package: the label pair (package identifier,
/// archive marker) plus a reference to the archive blob. No index is
/// exported; it is rebuilt on import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Canonical package identifier (`name-version`).
    pub package: String,
    /// Record kind; only [`ARCHIVE_MARKER`] records are documentation.
    pub kind: String,
    /// Hex blob id of the archive in the blob store.
    pub blob: String,
}

impl ExportRecord {
    /// Build an archive record for a package.
    pub fn archive(package: &PackageId, blob: &BlobId) -> Self {
        Self {
            package: package.to_string(),
            kind: ARCHIVE_MARKER.to_string(),
            blob: blob.to_hex(),
        }
    }

    /// Whether this record carries a documentation archive.
    pub fn is_archive(&self) -> bool {
        self.kind == ARCHIVE_MARKER
    }
}
