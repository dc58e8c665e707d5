//! HTTP request handlers.

pub mod admin;
pub mod auth;
pub mod docs;

pub use admin::*;
pub use auth::*;
pub use docs::*;
