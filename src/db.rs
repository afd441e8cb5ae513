//! # Tag Store Module
//!
//! Transactional key-value storage for the tag index. Keys are normalized tag
//! strings, values are opaque encoded entries owned by [`crate::tag_index`].
//!
//! Two implementations are provided:
//! - [`PgTagStore`]: PostgreSQL through `sqlx`, used in production
//! - [`MemoryTagStore`]: process-local map, used when no database is configured and in tests

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::StoreError;

/// Read-modify-write step executed inside a store transaction.
///
/// Receives the current value (`None` when the key is absent). Returning
/// `Ok(Some(bytes))` writes the value, `Ok(None)` leaves it untouched, and an
/// error aborts the transaction without writing anything.
pub type EntryUpdate =
    Box<dyn FnOnce(Option<&[u8]>) -> std::result::Result<Option<Vec<u8>>, StoreError> + Send>;

/// Transactional key-value store backing the tag index
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Fetch the value stored under `key`, `None` if there is none
    async fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, StoreError>;

    /// Atomically read, transform and write the value under `key`.
    ///
    /// Concurrent updates of the same key are serialized; none of them is lost.
    /// Returns whether a value was written.
    async fn update(&self, key: &str, apply: EntryUpdate) -> std::result::Result<bool, StoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> std::result::Result<(), StoreError>;
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS sticker_tags (
            tag TEXT PRIMARY KEY,
            stickers BYTEA NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create sticker_tags table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// PostgreSQL-backed tag store
#[derive(Debug, Clone)]
pub struct PgTagStore {
    pool: PgPool,
}

impl PgTagStore {
    /// Wrap an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and make sure the schema exists
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        init_database_schema(&pool).await?;

        Ok(Self { pool })
    }

    /// Close the underlying pool, waiting for in-flight transactions
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

#[async_trait]
impl TagStore for PgTagStore {
    async fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, StoreError> {
        let value: Option<Vec<u8>> =
            sqlx::query_scalar::<_, Vec<u8>>("SELECT stickers FROM sticker_tags WHERE tag = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        debug!(tag = %key, found = value.is_some(), "Fetched tag entry");
        Ok(value)
    }

    async fn update(&self, key: &str, apply: EntryUpdate) -> std::result::Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row locks cannot cover a key that does not exist yet, so serialize
        // writers of the same tag with a transaction-scoped advisory lock.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(key)
            .execute(&mut *tx)
            .await?;

        let current: Option<Vec<u8>> =
            sqlx::query_scalar::<_, Vec<u8>>("SELECT stickers FROM sticker_tags WHERE tag = $1")
                .bind(key)
                .fetch_optional(&mut *tx)
                .await?;

        // An error from `apply` drops `tx`, which rolls the transaction back
        let Some(value) = apply(current.as_deref())? else {
            tx.commit().await?;
            return Ok(false);
        };

        sqlx::query(
            "INSERT INTO sticker_tags (tag, stickers) VALUES ($1, $2)
             ON CONFLICT (tag) DO UPDATE SET stickers = EXCLUDED.stickers, updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> std::result::Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM sticker_tags WHERE tag = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        debug!(tag = %key, rows_affected = result.rows_affected(), "Deleted tag entry");
        Ok(())
    }
}

/// In-memory tag store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTagStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn update(&self, key: &str, apply: EntryUpdate) -> std::result::Result<bool, StoreError> {
        // The lock is held for the whole read-modify-write
        let mut entries = self.entries.lock().await;
        match apply(entries.get(key).map(Vec::as_slice))? {
            Some(value) => {
                entries.insert(key.to_string(), value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> std::result::Result<(), StoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
