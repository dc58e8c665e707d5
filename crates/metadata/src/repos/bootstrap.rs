//! Bootstrap state repository.

use crate::error::MetadataResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for server bootstrap state (the current admin token).
#[async_trait]
pub trait BootstrapRepo: Send + Sync {
    /// Get the id of the token created by admin bootstrap, if any.
    async fn get_bootstrap_token_id(&self) -> MetadataResult<Option<Uuid>>;

    /// Remember the token created by admin bootstrap.
    async fn set_bootstrap_token_id(&self, token_id: Uuid) -> MetadataResult<()>;
}
