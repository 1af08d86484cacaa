//! Durable resolution cache backed by SQLite.
//!
//! Caches per-title resolution outcomes (including not-found results) with a
//! TTL so repeated runs within the window never re-query the search provider.
//! Entries survive process restarts. Concurrent writers for the same key are
//! last-writer-wins, which is acceptable because entries for a given key are
//! computed identically.

use crate::error::{DatabaseError, Error, Result};
use crate::types::Resolution;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Key-value store with expiration for resolution results
pub struct ResultCache {
    pool: SqlitePool,
}

impl ResultCache {
    /// Open (or create) the cache database at the given path.
    ///
    /// Creates the parent directory and the schema if needed. The database
    /// runs in WAL mode so concurrent resolution tasks can read and write
    /// without corrupting entries.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to create cache directory: {}",
                    e
                )))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to parse cache path: {}",
                    e
                )))
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to connect to cache database: {}",
                e
            )))
        })?;

        let cache = Self { pool };
        cache.migrate().await?;

        Ok(cache)
    }

    /// Create the cache schema if it does not exist yet
    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resolution_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to create resolution_cache table: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Look up a live entry.
    ///
    /// Returns `None` for missing and for expired entries — callers cannot
    /// distinguish the two, and don't need to. A cached [`Resolution::NotFound`]
    /// is returned like any other value so it short-circuits provider queries
    /// within its TTL window.
    pub async fn get(&self, key: &str) -> Result<Option<Resolution>> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT value, expires_at FROM resolution_cache WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to read cache entry: {}",
                        e
                    )))
                })?;

        let Some((value, expires_at)) = row else {
            return Ok(None);
        };

        if expires_at <= chrono::Utc::now().timestamp() {
            // Stale row; left in place for purge_expired to reap
            return Ok(None);
        }

        match serde_json::from_str(&value) {
            Ok(resolution) => Ok(Some(resolution)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding corrupt cache entry");
                self.invalidate(key).await?;
                Ok(None)
            }
        }
    }

    /// Store a resolution outcome, replacing any previous entry for the key
    pub async fn set(&self, key: &str, value: &Resolution, ttl: Duration) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        let now = chrono::Utc::now().timestamp();
        let expires_at = now + ttl.as_secs() as i64;

        sqlx::query(
            r#"
            INSERT INTO resolution_cache (key, value, expires_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = ?, expires_at = ?, updated_at = ?
            "#,
        )
        .bind(key)
        .bind(&serialized)
        .bind(expires_at)
        .bind(now)
        .bind(&serialized)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to write cache entry: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Remove a single entry
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM resolution_cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to invalidate cache entry: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Delete all expired entries, returning how many were removed
    pub async fn purge_expired(&self) -> Result<u64> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query("DELETE FROM resolution_cache WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to purge expired cache entries: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected())
    }

    /// Number of entries currently stored (live and expired)
    pub async fn entry_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resolution_cache")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count cache entries: {}",
                    e
                )))
            })?;

        Ok(count as u64)
    }
}
