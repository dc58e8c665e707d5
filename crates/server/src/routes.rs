//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let docs_routes = Router::new()
        // Content retrieval by in-archive path; the bare and trailing-slash
        // forms both resolve the archive's content root.
        .route("/v1/packages/{package}/docs", get(handlers::get_doc_root))
        .route("/v1/packages/{package}/docs/", get(handlers::get_doc_root))
        .route(
            "/v1/packages/{package}/docs/{*path}",
            get(handlers::get_doc_file),
        )
        // Whole-archive retrieval, existence check and upload
        .route(
            "/v1/packages/{package}/docs.tar",
            get(handlers::get_doc_archive)
                .head(handlers::head_doc_archive)
                .put(handlers::put_doc_archive),
        );

    let api_routes = Router::new()
        // Auth discovery
        .route("/v1/auth/whoami", get(handlers::whoami))
        // Health check (intentionally unauthenticated for load balancers)
        .route("/v1/health", get(handlers::health_check))
        // Backup and restore
        .route("/v1/admin/backup", get(handlers::export_backup))
        .route("/v1/admin/restore", post(handlers::restore_backup))
        // Token management
        .route(
            "/v1/admin/tokens",
            post(handlers::create_token).get(handlers::list_tokens),
        )
        .route(
            "/v1/admin/tokens/{token_id}",
            delete(handlers::revoke_token),
        );

    let mut router = Router::new().merge(docs_routes).merge(api_routes);

    // SECURITY: when enabled, this endpoint should be network-restricted
    // to authorized Prometheus scraper IPs only.
    if state.config.server.metrics_enabled {
        router = router.merge(Router::new().route("/metrics", get(metrics_handler)));
    }

    // Middleware layers are applied in reverse order (outermost first).
    // Order of execution: TraceLayer -> Auth -> Handler
    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
