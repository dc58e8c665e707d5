//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid package id: {0}")]
    InvalidPackageId(String),

    #[error("invalid blob id: {0}")]
    InvalidHash(String),

    #[error("archive parse error: {0}")]
    ArchiveParse(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
