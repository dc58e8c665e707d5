//! HTTP API server for the Loft documentation archive.
//!
//! This crate provides the HTTP surface:
//! - Documentation file serving out of stored archives
//! - Whole-archive download and upload
//! - Backup export and restore
//! - Token management and admin bootstrap

pub mod auth;
pub mod backup;
pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod tarball;

pub use auth::TraceId;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
