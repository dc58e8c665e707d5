//! Metadata store trait and SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{BootstrapRepo, DocRepo, TokenRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: DocRepo + TokenRepo + BootstrapRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
///
/// SQLite's write transaction discipline is what serializes concurrent
/// mutations of a single package's association: the single-statement
/// upsert in `insert_or_replace_docs` commits atomically, so a lookup can
/// never observe a blob id and tar index from different uploads.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    #[allow(dead_code)] // Reserved for a future timeout wrapper
    query_timeout_secs: u64,
}

impl SqliteStore {
    /// Create a new SQLite store.
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        let query_timeout_secs = query_timeout_secs.unwrap_or(600);

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under axum concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self {
            pool,
            query_timeout_secs,
        };
        store.migrate().await?;

        tracing::debug!(path = %path.display(), "SQLite metadata store opened");

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Implement the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::{DocRow, TokenRow};
    use loft_core::PackageId;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[async_trait]
    impl DocRepo for SqliteStore {
        async fn lookup_docs(&self, package: &PackageId) -> MetadataResult<Option<DocRow>> {
            let row = sqlx::query_as::<_, DocRow>(
                "SELECT * FROM package_docs WHERE package_name = ? AND package_version = ?",
            )
            .bind(package.name())
            .bind(package.version())
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn has_docs(&self, package: &PackageId) -> MetadataResult<bool> {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM package_docs WHERE package_name = ? AND package_version = ?)",
            )
            .bind(package.name())
            .bind(package.version())
            .fetch_one(&self.pool)
            .await?;
            Ok(exists)
        }

        async fn insert_or_replace_docs(&self, row: &DocRow) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO package_docs (
                    package_name, package_version, blob_id, tar_index,
                    archive_size, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(package_name, package_version) DO UPDATE SET
                    blob_id = excluded.blob_id,
                    tar_index = excluded.tar_index,
                    archive_size = excluded.archive_size,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&row.package_name)
            .bind(&row.package_version)
            .bind(&row.blob_id)
            .bind(&row.tar_index)
            .bind(row.archive_size)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn snapshot_docs(&self) -> MetadataResult<Vec<DocRow>> {
            let rows = sqlx::query_as::<_, DocRow>(
                "SELECT * FROM package_docs ORDER BY package_name, package_version",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn replace_all_docs(&self, rows: &[DocRow]) -> MetadataResult<()> {
            let mut tx = self.pool.begin().await?;

            sqlx::query("DELETE FROM package_docs")
                .execute(&mut *tx)
                .await?;

            for row in rows {
                sqlx::query(
                    r#"
                    INSERT INTO package_docs (
                        package_name, package_version, blob_id, tar_index,
                        archive_size, created_at, updated_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&row.package_name)
                .bind(&row.package_version)
                .bind(&row.blob_id)
                .bind(&row.tar_index)
                .bind(row.archive_size)
                .bind(row.created_at)
                .bind(row.updated_at)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            Ok(())
        }
    }

    #[async_trait]
    impl TokenRepo for SqliteStore {
        async fn create_token(&self, token: &TokenRow) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO tokens (
                    token_id, token_hash, scopes, expires_at, revoked_at,
                    created_at, last_used_at, description
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(token.token_id)
            .bind(&token.token_hash)
            .bind(&token.scopes)
            .bind(token.expires_at)
            .bind(token.revoked_at)
            .bind(token.created_at)
            .bind(token.last_used_at)
            .bind(&token.description)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    MetadataError::AlreadyExists("token hash already exists".to_string())
                }
                other => MetadataError::Database(other),
            })?;
            Ok(())
        }

        async fn get_token_by_hash(&self, token_hash: &str) -> MetadataResult<Option<TokenRow>> {
            let row = sqlx::query_as::<_, TokenRow>("SELECT * FROM tokens WHERE token_hash = ?")
                .bind(token_hash)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn get_token(&self, token_id: Uuid) -> MetadataResult<Option<TokenRow>> {
            let row = sqlx::query_as::<_, TokenRow>("SELECT * FROM tokens WHERE token_id = ?")
                .bind(token_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn touch_token(
            &self,
            token_id: Uuid,
            used_at: OffsetDateTime,
        ) -> MetadataResult<()> {
            sqlx::query("UPDATE tokens SET last_used_at = ? WHERE token_id = ?")
                .bind(used_at)
                .bind(token_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn revoke_token(
            &self,
            token_id: Uuid,
            revoked_at: OffsetDateTime,
        ) -> MetadataResult<()> {
            let result = sqlx::query("UPDATE tokens SET revoked_at = ? WHERE token_id = ?")
                .bind(revoked_at)
                .bind(token_id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "token {token_id} not found"
                )));
            }
            Ok(())
        }

        async fn list_tokens(&self) -> MetadataResult<Vec<TokenRow>> {
            let rows = sqlx::query_as::<_, TokenRow>("SELECT * FROM tokens ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl BootstrapRepo for SqliteStore {
        async fn get_bootstrap_token_id(&self) -> MetadataResult<Option<Uuid>> {
            let id: Option<Uuid> =
                sqlx::query_scalar("SELECT token_id FROM bootstrap WHERE key = 'admin_token'")
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(id)
        }

        async fn set_bootstrap_token_id(&self, token_id: Uuid) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO bootstrap (key, token_id) VALUES ('admin_token', ?)
                ON CONFLICT(key) DO UPDATE SET token_id = excluded.token_id
                "#,
            )
            .bind(token_id)
            .execute(&self.pool)
            .await?;
            Ok(())
        }
    }
}

const SCHEMA_SQL: &str = r#"
-- Documentation archive associations, one row per package version
CREATE TABLE IF NOT EXISTS package_docs (
    package_name TEXT NOT NULL,
    package_version TEXT NOT NULL,
    blob_id TEXT NOT NULL,
    tar_index TEXT NOT NULL,
    archive_size INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (package_name, package_version)
);
CREATE INDEX IF NOT EXISTS idx_package_docs_blob ON package_docs(blob_id);

-- Tokens
CREATE TABLE IF NOT EXISTS tokens (
    token_id BLOB PRIMARY KEY,
    token_hash TEXT NOT NULL UNIQUE,
    scopes TEXT NOT NULL,
    expires_at TEXT,
    revoked_at TEXT,
    created_at TEXT NOT NULL,
    last_used_at TEXT,
    description TEXT
);
CREATE INDEX IF NOT EXISTS idx_tokens_hash ON tokens(token_hash);

-- Server bootstrap state
CREATE TABLE IF NOT EXISTS bootstrap (
    key TEXT PRIMARY KEY,
    token_id BLOB NOT NULL
);
"#;
