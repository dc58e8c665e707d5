//! Prometheus metrics for the Loft server.
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping
//! and exposes only aggregate usage, never package names or paths. Restrict
//! the endpoint to authorized scraper IPs at the infrastructure level.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static DOC_FILES_SERVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "loft_doc_files_served_total",
        "Total number of documentation files served out of archives",
    )
    .expect("metric creation failed")
});

pub static DOC_ARCHIVES_SERVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "loft_doc_archives_served_total",
        "Total number of whole documentation archives served",
    )
    .expect("metric creation failed")
});

pub static DOC_ARCHIVES_UPLOADED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "loft_doc_archives_uploaded_total",
        "Total number of documentation archives uploaded",
    )
    .expect("metric creation failed")
});

pub static DOC_UPLOAD_BYTES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "loft_doc_upload_bytes_total",
        "Total bytes of uploaded documentation archives",
    )
    .expect("metric creation failed")
});

pub static DOC_UPLOAD_ERRORS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "loft_doc_upload_errors_total",
            "Total upload errors by error type",
        ),
        &["error_type"],
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry. Idempotent.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(DOC_FILES_SERVED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DOC_ARCHIVES_SERVED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DOC_ARCHIVES_UPLOADED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DOC_UPLOAD_BYTES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DOC_UPLOAD_ERRORS.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus exposition.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Helper to record upload errors by type.
pub fn record_upload_error(error_type: &str) {
    DOC_UPLOAD_ERRORS.with_label_values(&[error_type]).inc();
}
