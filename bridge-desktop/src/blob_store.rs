//! Imported-audio blob storage using SQLite

use async_trait::async_trait;
use bridge_traits::{error::Result, storage::BlobStore};
use bytes::Bytes;
use sqlx::{sqlite::SqlitePool, Row};
use std::path::PathBuf;
use tracing::{debug, instrument};

use crate::sqlite::{db_error, ensure_schema, now, open_file, open_in_memory};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS files (
        key TEXT PRIMARY KEY,
        data BLOB NOT NULL,
        size INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

/// SQLite-backed [`BlobStore`].
///
/// Blobs live in a single `files` table keyed by the import's file key.
pub struct SqliteBlobStore {
    pool: SqlitePool,
}

impl SqliteBlobStore {
    /// Open the store at `db_path`. Fails with `NotAvailable` when the file
    /// cannot be created or opened.
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        let pool = open_file(&db_path).await?;
        ensure_schema(&pool, SCHEMA).await?;
        debug!(path = ?db_path, "Initialized blob store");
        Ok(Self { pool })
    }

    /// Create an in-memory blob store (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = open_in_memory().await?;
        ensure_schema(&pool, SCHEMA).await?;
        Ok(Self { pool })
    }

    /// Share a pool already opened for another store.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        ensure_schema(&pool, SCHEMA).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO files (key, data, size, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                data = excluded.data,
                size = excluded.size,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(data.as_ref())
        .bind(data.len() as i64)
        .bind(now())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to store blob", e))?;

        debug!("Stored blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let row = sqlx::query("SELECT data FROM files WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to read blob", e))?;

        Ok(row.map(|row| Bytes::from(row.get::<Vec<u8>, _>(0))))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM files WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete blob", e))?;

        debug!(key = key, "Deleted blob");
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM files WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to check blob", e))?;

        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = SqliteBlobStore::in_memory().await.unwrap();

        store
            .put("file_1", Bytes::from_static(b"ID3\x04audio"))
            .await
            .unwrap();
        assert_eq!(
            store.get("file_1").await.unwrap(),
            Some(Bytes::from_static(b"ID3\x04audio"))
        );
        assert!(store.contains("file_1").await.unwrap());

        store.delete("file_1").await.unwrap();
        assert_eq!(store.get("file_1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_replaces_existing_value() {
        let store = SqliteBlobStore::in_memory().await.unwrap();

        store.put("k", Bytes::from_static(b"old")).await.unwrap();
        store.put("k", Bytes::from_static(b"new")).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(Bytes::from_static(b"new")));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let store = SqliteBlobStore::in_memory().await.unwrap();
        assert_eq!(store.get("missing").await.unwrap(), None);
        store.delete("missing").await.unwrap();
    }
}
