//! Documentation retrieval and upload handlers.

use crate::auth::require_auth;
use crate::error::{ApiError, ApiResult};
use crate::metrics::{
    DOC_ARCHIVES_SERVED, DOC_ARCHIVES_UPLOADED, DOC_FILES_SERVED, DOC_UPLOAD_BYTES,
    record_upload_error,
};
use crate::state::AppState;
use crate::tarball;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use loft_core::token::TokenScope;
use loft_core::{PackageId, TarIndex};
use loft_metadata::models::DocRow;
use time::OffsetDateTime;

/// Look up the documentation entry for a package, failing with a
/// NotFound that names the package.
async fn lookup_entry(state: &AppState, package: &PackageId) -> ApiResult<DocRow> {
    state
        .metadata
        .lookup_docs(package)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no documentation for package: {package}")))
}

/// GET /v1/packages/{package}/docs/{*path} - Serve a file out of the archive.
pub async fn get_doc_file(
    State(state): State<AppState>,
    Path((package, path)): Path<(String, String)>,
) -> ApiResult<Response> {
    serve_doc_path(&state, &package, &path).await
}

/// GET /v1/packages/{package}/docs - Serve the archive's content root.
pub async fn get_doc_root(
    State(state): State<AppState>,
    Path(package): Path<String>,
) -> ApiResult<Response> {
    serve_doc_path(&state, &package, "").await
}

async fn serve_doc_path(state: &AppState, package: &str, path: &str) -> ApiResult<Response> {
    let package = PackageId::parse(package)?;
    let row = lookup_entry(state, &package).await?;

    let index: TarIndex = row
        .index()
        .map_err(|e| ApiError::Internal(format!("stored tar index is unreadable: {e}")))?;
    let blob = row.blob()?;

    let response = tarball::serve_entry(
        &state.storage,
        &index,
        &blob,
        path,
        &state.config.server.default_documents,
        &package.docs_root_label(),
    )
    .await?;

    DOC_FILES_SERVED.inc();
    Ok(response)
}

/// GET /v1/packages/{package}/docs.tar - Serve the raw archive.
pub async fn get_doc_archive(
    State(state): State<AppState>,
    Path(package): Path<String>,
) -> ApiResult<Response> {
    let package = PackageId::parse(&package)?;
    let row = lookup_entry(&state, &package).await?;
    let blob = row.blob()?;

    let response = tarball::serve_whole(&state.storage, &blob).await?;
    DOC_ARCHIVES_SERVED.inc();
    Ok(response)
}

/// HEAD /v1/packages/{package}/docs.tar - Documentation existence check.
pub async fn head_doc_archive(
    State(state): State<AppState>,
    Path(package): Path<String>,
) -> ApiResult<StatusCode> {
    let package = PackageId::parse(&package)?;
    if state.metadata.has_docs(&package).await? {
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

/// PUT /v1/packages/{package}/docs.tar - Upload a documentation archive.
///
/// The blob is durably persisted before the association is updated, so a
/// crash between the two steps never leaves the store pointing at a
/// non-existent blob. If index construction fails after the blob persisted,
/// the association is left untouched and the new blob is simply orphaned.
#[tracing::instrument(skip(state, req), fields(package = %package))]
pub async fn put_doc_archive(
    State(state): State<AppState>,
    Path(package): Path<String>,
    req: Request,
) -> ApiResult<StatusCode> {
    // Authorization happens before any blob-store or index work.
    let auth = require_auth(&req)?;
    auth.require_scope(TokenScope::DocsWrite)?;

    let package = PackageId::parse(&package)?;

    let max_bytes = usize::try_from(state.config.server.max_archive_bytes)
        .unwrap_or(usize::MAX);
    let body = axum::body::to_bytes(req.into_body(), max_bytes)
        .await
        .map_err(|e| {
            record_upload_error("body_read");
            ApiError::BadRequest(format!("failed to read archive body: {e}"))
        })?;

    if body.is_empty() {
        record_upload_error("empty_body");
        return Err(ApiError::BadArchive(format!("{package}: empty archive body")));
    }
    if let Some(kind) = compression_magic(&body) {
        record_upload_error("compressed_body");
        return Err(ApiError::BadArchive(format!(
            "{package}: expected an uncompressed tar stream, got {kind}"
        )));
    }

    let archive_size = body.len() as u64;
    let blob = state.storage.add(body).await?;

    // Index the persisted blob off the async runtime; header scan only.
    let archive_path = state.storage.blob_path(&blob);
    let index = tokio::task::spawn_blocking(move || TarIndex::from_path(&archive_path))
        .await
        .map_err(|e| ApiError::Internal(format!("index construction task failed: {e}")))?
        .map_err(|e| {
            record_upload_error("bad_archive");
            ApiError::BadArchive(format!("{package}: {e}"))
        })?;

    let row = DocRow::new(
        &package,
        &blob,
        &index,
        archive_size,
        OffsetDateTime::now_utc(),
    )
    .map_err(|e| ApiError::Internal(format!("failed to serialize index: {e}")))?;
    state.metadata.insert_or_replace_docs(&row).await?;

    DOC_ARCHIVES_UPLOADED.inc();
    DOC_UPLOAD_BYTES.inc_by(archive_size);
    tracing::info!(
        package = %row.package_name,
        version = %row.package_version,
        blob = %blob,
        entries = index.file_count(),
        "Documentation archive stored"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Detect well-known compression magic bytes at the start of a body.
fn compression_magic(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x1f, 0x8b]) {
        Some("gzip")
    } else if data.starts_with(b"BZh") {
        Some("bzip2")
    } else if data.starts_with(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]) {
        Some("xz")
    } else if data.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
        Some("zstd")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_magic() {
        assert_eq!(compression_magic(&[0x1f, 0x8b, 0x08]), Some("gzip"));
        assert_eq!(compression_magic(b"BZh91AY"), Some("bzip2"));
        assert_eq!(
            compression_magic(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00, 0x00]),
            Some("xz")
        );
        assert_eq!(compression_magic(&[0x28, 0xb5, 0x2f, 0xfd, 0x01]), Some("zstd"));
        assert_eq!(compression_magic(b"plain tar header bytes"), None);
        assert_eq!(compression_magic(b""), None);
    }
}
