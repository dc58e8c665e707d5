//! Index-driven serving of tarball contents.
//!
//! Serves either a whole raw archive, or a single logical file inside it by
//! streaming exactly the entry's byte range out of the stored blob. The
//! archive is never extracted to a scratch directory and never loaded whole.

use crate::error::{ApiError, ApiResult};
use axum::body::Body;
use axum::http::StatusCode;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use loft_core::{BlobId, EntryLocation, EntrySpan, TarIndex};
use loft_storage::BlobStore;
use std::sync::Arc;

/// Content type for raw tar payloads.
pub const TAR_CONTENT_TYPE: &str = "application/x-tar";

/// Serve the raw archive bytes unchanged.
pub async fn serve_whole(storage: &Arc<dyn BlobStore>, blob: &BlobId) -> ApiResult<Response> {
    let meta = storage.meta(blob).await?;
    let stream = storage.fetch_stream(blob).await?;
    let body_stream = stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string())));

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, TAR_CONTENT_TYPE),
            (CONTENT_LENGTH, &meta.size.to_string()),
        ],
        Body::from_stream(body_stream),
    )
        .into_response())
}

/// Resolve `requested_path` within the archive and stream the located entry.
///
/// A path resolving to a directory (including the implicit root) falls back
/// to the first of `default_documents` present in that directory. The
/// `archive_root_label` appears in the not-found diagnostic only; it plays
/// no part in resolution.
pub async fn serve_entry(
    storage: &Arc<dyn BlobStore>,
    index: &TarIndex,
    blob: &BlobId,
    requested_path: &str,
    default_documents: &[String],
    archive_root_label: &str,
) -> ApiResult<Response> {
    let Some((path, span)) = resolve(index, requested_path, default_documents) else {
        return Err(ApiError::NotFound(format!(
            "documentation path not found: {requested_path:?} in {archive_root_label}"
        )));
    };

    let stream = storage.read_range_stream(blob, span.offset, span.size).await?;
    let body_stream = stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string())));

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, content_type_for(&path)),
            (CONTENT_LENGTH, &span.size.to_string()),
        ],
        Body::from_stream(body_stream),
    )
        .into_response())
}

/// Resolve a logical path to a servable file entry, applying the
/// default-document fallback for directories.
fn resolve(
    index: &TarIndex,
    requested_path: &str,
    default_documents: &[String],
) -> Option<(String, EntrySpan)> {
    let trimmed = requested_path.trim_matches('/');
    match index.lookup(trimmed)? {
        EntryLocation::File(span) => Some((trimmed.to_string(), span)),
        EntryLocation::Directory => default_documents.iter().find_map(|doc| {
            let candidate = if trimmed.is_empty() {
                doc.clone()
            } else {
                format!("{trimmed}/{doc}")
            };
            match index.lookup(&candidate) {
                Some(EntryLocation::File(span)) => Some((candidate, span)),
                _ => None,
            }
        }),
    }
}

/// Content type inferred from a file extension.
fn content_type_for(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or("");
    match extension {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" | "md" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> TarIndex {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, data) in [
            ("docs/index.html", &b"<html>root</html>"[..]),
            ("docs/Mylib.html", b"<html>mylib</html>"),
            ("docs/src/main.rs.html", b"source"),
        ] {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, data).unwrap();
        }
        TarIndex::from_bytes(&builder.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_resolve_file_directly() {
        let index = sample_index();
        let defaults = vec!["index.html".to_string()];
        let (path, _) = resolve(&index, "Mylib.html", &defaults).unwrap();
        assert_eq!(path, "Mylib.html");
    }

    #[test]
    fn test_resolve_root_falls_back_to_default_document() {
        let index = sample_index();
        let defaults = vec!["index.html".to_string()];
        let (path, _) = resolve(&index, "", &defaults).unwrap();
        assert_eq!(path, "index.html");

        // Equivalent with stray slashes
        let (path, _) = resolve(&index, "/", &defaults).unwrap();
        assert_eq!(path, "index.html");
    }

    #[test]
    fn test_resolve_directory_without_default_document() {
        let index = sample_index();
        let defaults = vec!["index.html".to_string()];
        assert!(resolve(&index, "src", &defaults).is_none());
    }

    #[test]
    fn test_resolve_missing_path() {
        let index = sample_index();
        let defaults = vec!["index.html".to_string()];
        assert!(resolve(&index, "missing.html", &defaults).is_none());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("a/b.html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("style.css"), "text/css; charset=utf-8");
        assert_eq!(content_type_for("unknown.bin"), "application/octet-stream");
        assert_eq!(content_type_for("no-extension"), "application/octet-stream");
    }
}
