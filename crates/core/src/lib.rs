//! Core domain types and shared logic for the Loft documentation server.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Package identifiers (name + version)
//! - Blob identifiers for content-addressed archives
//! - Tar indexes mapping archive entry paths to byte ranges
//! - Backup export records
//! - Token scopes and authorization

pub mod backup;
pub mod config;
pub mod error;
pub mod hash;
pub mod package;
pub mod tar_index;
pub mod token;

pub use backup::{ARCHIVE_MARKER, ExportRecord};
pub use error::{Error, Result};
pub use hash::{BlobHasher, BlobId};
pub use package::PackageId;
pub use tar_index::{EntryLocation, EntrySpan, TarIndex};
pub use token::{Token, TokenId, TokenScope};

/// Default upper bound for uploaded documentation archives: 256 MiB.
pub const DEFAULT_MAX_ARCHIVE_BYTES: u64 = 256 * 1024 * 1024;
