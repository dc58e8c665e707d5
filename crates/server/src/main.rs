//! Loft server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use loft_core::config::AppConfig;
use loft_server::bootstrap::ensure_admin_token;
use loft_server::{AppState, create_router};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Loft - a documentation archive server for package repositories
#[derive(Parser, Debug)]
#[command(name = "loftd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "LOFT_CONFIG", default_value = "config/server.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Loft v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("LOFT_") && key != "LOFT_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: loftd --config /path/to/config.toml\n  \
             2. Environment variables: LOFT_SERVER__BIND=0.0.0.0:8080 \
             LOFT_ADMIN__TOKEN_HASH=YOUR_TOKEN_HASH_HERE loftd\n\n\
             Set LOFT_CONFIG to specify a default config file path."
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("LOFT_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Register Prometheus metrics
    loft_server::metrics::register_metrics();

    // Initialize blob storage and verify connectivity before accepting
    // requests, so the server never reports healthy with storage missing.
    let storage = loft_storage::from_config(&config.storage)
        .await
        .context("failed to initialize blob storage")?;
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!(backend = storage.backend_name(), "Blob storage initialized");

    // Initialize metadata store
    let metadata = loft_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    tracing::info!("Metadata store initialized");

    // Initialize admin token
    ensure_admin_token(metadata.as_ref(), &config.admin).await?;

    // Create application state and router
    let state = AppState::new(config.clone(), storage, metadata);
    let app = create_router(state);

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
