//! Integration tests for the documentation HTTP API.

mod common;

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use common::TestServer;
use common::fixtures::{
    MYLIB_INDEX_HTML, MYLIB_MODULE_HTML, MYLIB_SRC_INDEX_HTML, docs_archive, mylib_archive,
};
use loft_core::{BlobId, PackageId};
use tower::ServiceExt;

/// Make a raw request and return status, content type and body bytes.
async fn send(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Vec<u8>>,
    auth_token: Option<&str>,
) -> (StatusCode, Option<String>, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = auth_token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let body = match body {
        Some(bytes) => Body::from(bytes),
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, content_type, body_bytes)
}

/// Upload an archive for a package, asserting success.
async fn upload(server: &TestServer, package: &str, archive: Vec<u8>, token: &str) {
    let uri = format!("/v1/packages/{package}/docs.tar");
    let (status, _, body) = send(&server.router, "PUT", &uri, Some(archive), Some(token)).await;
    assert_eq!(
        status,
        StatusCode::NO_CONTENT,
        "upload failed: {}",
        String::from_utf8_lossy(&body)
    );
}

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let (status, _, body) = send(&server.router, "GET", "/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("ok"));
}

#[tokio::test]
async fn test_get_docs_for_unknown_package() {
    let server = TestServer::new().await;

    let (status, _, body) = send(
        &server.router,
        "GET",
        "/v1/packages/mylib-1.0/docs/",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(String::from_utf8_lossy(&body).contains("mylib-1.0"));
}

#[tokio::test]
async fn test_upload_requires_auth() {
    let server = TestServer::new().await;

    let (status, _, _) = send(
        &server.router,
        "PUT",
        "/v1/packages/mylib-1.0/docs.tar",
        Some(mylib_archive()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_requires_write_scope() {
    let server = TestServer::new().await;
    let token = server.create_test_token(r#"["docs:read"]"#).await;

    let (status, _, _) = send(
        &server.router,
        "PUT",
        "/v1/packages/mylib-1.0/docs.tar",
        Some(mylib_archive()),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_upload_then_retrieve_scenario() {
    let server = TestServer::new().await;
    let token = server.create_test_token(r#"["docs:write"]"#).await;
    let archive = mylib_archive();

    upload(&server, "mylib-1.0", archive.clone(), &token).await;

    // Content root resolves to the default document's bytes
    let (status, content_type, body) = send(
        &server.router,
        "GET",
        "/v1/packages/mylib-1.0/docs/",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/html; charset=utf-8"));
    assert_eq!(&body[..], MYLIB_INDEX_HTML);

    // The bare (no trailing slash) form behaves identically
    let (status, _, body) = send(
        &server.router,
        "GET",
        "/v1/packages/mylib-1.0/docs",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], MYLIB_INDEX_HTML);

    // A direct file request resolves to that file's bytes
    let (status, _, body) = send(
        &server.router,
        "GET",
        "/v1/packages/mylib-1.0/docs/Mylib.html",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], MYLIB_MODULE_HTML);

    // The root request matches the direct request for the default document
    let (status, _, body) = send(
        &server.router,
        "GET",
        "/v1/packages/mylib-1.0/docs/index.html",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], MYLIB_INDEX_HTML);

    // A subdirectory falls back to its own default document
    let (status, _, body) = send(
        &server.router,
        "GET",
        "/v1/packages/mylib-1.0/docs/src",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], MYLIB_SRC_INDEX_HTML);

    // A missing path is NotFound, naming the path
    let (status, _, body) = send(
        &server.router,
        "GET",
        "/v1/packages/mylib-1.0/docs/missing.html",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(String::from_utf8_lossy(&body).contains("missing.html"));

    // The whole-archive path returns the original tar bytes byte-for-byte
    let (status, content_type, body) = send(
        &server.router,
        "GET",
        "/v1/packages/mylib-1.0/docs.tar",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/x-tar"));
    assert_eq!(&body[..], &archive[..]);
}

#[tokio::test]
async fn test_head_reports_documentation_existence() {
    let server = TestServer::new().await;
    let token = server.create_test_token(r#"["docs:write"]"#).await;

    let (status, _, _) = send(
        &server.router,
        "HEAD",
        "/v1/packages/mylib-1.0/docs.tar",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    upload(&server, "mylib-1.0", mylib_archive(), &token).await;

    let (status, _, _) = send(
        &server.router,
        "HEAD",
        "/v1/packages/mylib-1.0/docs.tar",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reupload_replaces_association_and_orphans_old_blob() {
    let server = TestServer::new().await;
    let token = server.create_test_token(r#"["docs:write"]"#).await;

    let first = docs_archive(&[("mylib-1.0-docs/index.html", b"first edition")]);
    let second = docs_archive(&[("mylib-1.0-docs/index.html", b"second edition")]);
    let first_blob = BlobId::compute(&first);

    upload(&server, "mylib-1.0", first.clone(), &token).await;
    upload(&server, "mylib-1.0", second.clone(), &token).await;

    // Exactly one entry, pointing at the second upload
    let snapshot = server.metadata().snapshot_docs().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].blob_id, BlobId::compute(&second).to_hex());

    let (status, _, body) = send(
        &server.router,
        "GET",
        "/v1/packages/mylib-1.0/docs/index.html",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"second edition");

    // The first blob is orphaned but still fetchable from the blob store
    let orphan = server.storage().fetch(&first_blob).await.unwrap();
    assert_eq!(&orphan[..], &first[..]);
}

#[tokio::test]
async fn test_upload_rejects_compressed_body() {
    let server = TestServer::new().await;
    let token = server.create_test_token(r#"["docs:write"]"#).await;

    // gzip magic bytes
    let mut body = vec![0x1f, 0x8b, 0x08, 0x00];
    body.extend_from_slice(&[0u8; 128]);

    let (status, _, response) = send(
        &server.router,
        "PUT",
        "/v1/packages/mylib-1.0/docs.tar",
        Some(body),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(String::from_utf8_lossy(&response).contains("gzip"));

    let pkg = PackageId::parse("mylib-1.0").unwrap();
    assert!(!server.metadata().has_docs(&pkg).await.unwrap());
}

#[tokio::test]
async fn test_upload_rejects_truncated_archive_and_keeps_prior_entry() {
    let server = TestServer::new().await;
    let token = server.create_test_token(r#"["docs:write"]"#).await;

    let good = docs_archive(&[("mylib-1.0-docs/index.html", &[0x61u8; 4096][..])]);
    upload(&server, "mylib-1.0", good.clone(), &token).await;

    let mut truncated = good.clone();
    truncated.truncate(truncated.len() / 2);

    let (status, _, _) = send(
        &server.router,
        "PUT",
        "/v1/packages/mylib-1.0/docs.tar",
        Some(truncated),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Prior association is unchanged
    let snapshot = server.metadata().snapshot_docs().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].blob_id, BlobId::compute(&good).to_hex());
}

#[tokio::test]
async fn test_invalid_package_id_is_rejected() {
    let server = TestServer::new().await;

    let (status, _, _) = send(
        &server.router,
        "GET",
        "/v1/packages/not!a!package/docs/",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_docs_are_isolated_per_version() {
    let server = TestServer::new().await;
    let token = server.create_test_token(r#"["docs:write"]"#).await;

    upload(
        &server,
        "mylib-1.0",
        docs_archive(&[("mylib-1.0-docs/index.html", b"v1 docs")]),
        &token,
    )
    .await;
    upload(
        &server,
        "mylib-2.0",
        docs_archive(&[("mylib-2.0-docs/index.html", b"v2 docs")]),
        &token,
    )
    .await;

    let (_, _, body) = send(
        &server.router,
        "GET",
        "/v1/packages/mylib-1.0/docs/",
        None,
        None,
    )
    .await;
    assert_eq!(&body[..], b"v1 docs");

    let (_, _, body) = send(
        &server.router,
        "GET",
        "/v1/packages/mylib-2.0/docs/",
        None,
        None,
    )
    .await;
    assert_eq!(&body[..], b"v2 docs");
}

#[tokio::test]
async fn test_admin_scope_implies_write() {
    let server = TestServer::new().await;
    let token = server.create_test_token(r#"["docs:admin"]"#).await;

    upload(&server, "mylib-1.0", mylib_archive(), &token).await;
}
