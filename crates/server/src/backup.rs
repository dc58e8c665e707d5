//! Backup export and restore.
//!
//! Export walks the store snapshot and emits one record per package holding
//! the package label, the fixed archive marker, and the blob reference.
//! The index is never exported; it is rebuilt on import. Restore is a
//! sequential fold over the posted records that accumulates a fresh
//! snapshot and commits it atomically at the end via `replace_all_docs`.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use loft_core::{BlobId, ExportRecord, PackageId, TarIndex};
use loft_metadata::models::DocRow;
use time::OffsetDateTime;

/// Export the store's entries as backup records.
pub async fn export_store(state: &AppState) -> ApiResult<Vec<ExportRecord>> {
    let rows = state.metadata.snapshot_docs().await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let package = row.package_id()?;
        let blob = row.blob()?;
        records.push(ExportRecord::archive(&package, &blob));
    }
    Ok(records)
}

/// Restore the store from backup records, replacing the whole aggregate.
///
/// Records not matching the archive marker are ignored, and records whose
/// package label does not parse are skipped silently (they are treated as
/// not-a-documentation record). A missing blob or an unindexable archive
/// fails the whole restore instead: reconstructing a corrupt store is worse
/// than stopping. The asymmetry is deliberate.
pub async fn restore_store(state: &AppState, records: &[ExportRecord]) -> ApiResult<usize> {
    let now = OffsetDateTime::now_utc();
    let mut rows: Vec<DocRow> = Vec::new();

    for record in records {
        if !record.is_archive() {
            continue;
        }
        let Ok(package) = PackageId::parse(&record.package) else {
            tracing::debug!(
                entry = %record.package,
                "skipping backup record with unparsable package label"
            );
            continue;
        };

        let blob = BlobId::from_hex(&record.blob).map_err(|e| {
            ApiError::RestoreFailed(format!("{package}: invalid blob reference: {e}"))
        })?;
        let bytes = state
            .storage
            .fetch(&blob)
            .await
            .map_err(|e| ApiError::RestoreFailed(format!("{package}: {e}")))?;
        let index = TarIndex::from_bytes(&bytes)
            .map_err(|e| ApiError::RestoreFailed(format!("{package}: {e}")))?;

        let row = DocRow::new(&package, &blob, &index, bytes.len() as u64, now)
            .map_err(|e| ApiError::Internal(format!("failed to serialize index: {e}")))?;
        rows.push(row);
    }

    state.metadata.replace_all_docs(&rows).await?;

    tracing::info!(restored = rows.len(), "Documentation store restored from backup");
    Ok(rows.len())
}
