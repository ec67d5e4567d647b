//! Response cache storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    cache::CacheStorage,
    error::{BridgeError, Result},
    http::HttpResponse,
};
use bytes::Bytes;
use sqlx::{sqlite::SqlitePool, Row};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use crate::sqlite::{db_error, ensure_schema, now, open_file, open_in_memory};

const CACHES_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS caches (
        name TEXT PRIMARY KEY,
        created_at INTEGER NOT NULL
    )
"#;

const ENTRIES_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS cache_entries (
        cache_name TEXT NOT NULL,
        request_key TEXT NOT NULL,
        status INTEGER NOT NULL,
        headers TEXT NOT NULL,
        body BLOB NOT NULL,
        stored_at INTEGER NOT NULL,
        PRIMARY KEY (cache_name, request_key)
    )
"#;

/// SQLite-backed [`CacheStorage`].
pub struct SqliteCacheStorage {
    pool: SqlitePool,
}

impl SqliteCacheStorage {
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        let pool = open_file(&db_path).await?;
        Self::with_pool(pool).await
    }

    /// Create an in-memory cache storage (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = open_in_memory().await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        ensure_schema(&pool, CACHES_SCHEMA).await?;
        ensure_schema(&pool, ENTRIES_SCHEMA).await?;
        Ok(Self { pool })
    }

    fn encode_headers(headers: &HashMap<String, String>) -> Result<String> {
        serde_json::to_string(headers)
            .map_err(|e| BridgeError::OperationFailed(format!("Header encoding failed: {}", e)))
    }
}

const UPSERT_CACHE: &str = "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?, ?)";

const UPSERT_ENTRY: &str = r#"
    INSERT INTO cache_entries (cache_name, request_key, status, headers, body, stored_at)
    VALUES (?, ?, ?, ?, ?, ?)
    ON CONFLICT(cache_name, request_key) DO UPDATE SET
        status = excluded.status,
        headers = excluded.headers,
        body = excluded.body,
        stored_at = excluded.stored_at
"#;

#[async_trait]
impl CacheStorage for SqliteCacheStorage {
    async fn match_request(&self, cache: &str, key: &str) -> Result<Option<HttpResponse>> {
        let row = sqlx::query(
            "SELECT status, headers, body FROM cache_entries WHERE cache_name = ? AND request_key = ?",
        )
        .bind(cache)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to match request", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status: i64 = row.get(0);
        let headers: String = row.get(1);
        let body: Vec<u8> = row.get(2);
        // Unreadable headers are not worth failing a cache hit over
        let headers = serde_json::from_str(&headers).unwrap_or_default();

        Ok(Some(HttpResponse {
            status: status as u16,
            headers,
            body: Bytes::from(body),
        }))
    }

    async fn put(&self, cache: &str, key: &str, response: HttpResponse) -> Result<()> {
        self.put_all(cache, vec![(key.to_string(), response)]).await
    }

    async fn put_all(&self, cache: &str, entries: Vec<(String, HttpResponse)>) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let stamp = now();
        sqlx::query(UPSERT_CACHE)
            .bind(cache)
            .bind(stamp)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to create cache", e))?;

        let count = entries.len();
        for (key, response) in entries {
            let headers = Self::encode_headers(&response.headers)?;
            sqlx::query(UPSERT_ENTRY)
                .bind(cache)
                .bind(&key)
                .bind(response.status as i64)
                .bind(headers)
                .bind(response.body.as_ref())
                .bind(stamp)
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("Failed to store response", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit", e))?;

        debug!(cache = cache, entries = count, "Stored cache entries");
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM caches ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list caches", e))?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    async fn delete_cache(&self, cache: &str) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        sqlx::query("DELETE FROM cache_entries WHERE cache_name = ?")
            .bind(cache)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to delete entries", e))?;

        let removed = sqlx::query("DELETE FROM caches WHERE name = ?")
            .bind(cache)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to delete cache", e))?
            .rows_affected();

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit", e))?;

        debug!(cache = cache, existed = removed > 0, "Deleted cache");
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &'static str) -> HttpResponse {
        HttpResponse::new(200, Bytes::from_static(body.as_bytes()))
            .with_header("content-type", "text/html")
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let storage = SqliteCacheStorage::in_memory().await.unwrap();

        storage
            .put("otp-cache-v1", "GET https://app/index.html", response("<html>"))
            .await
            .unwrap();

        let hit = storage
            .match_request("otp-cache-v1", "GET https://app/index.html")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.status, 200);
        assert_eq!(hit.body, Bytes::from_static(b"<html>"));
        assert_eq!(hit.headers.get("content-type").map(String::as_str), Some("text/html"));

        assert!(storage
            .match_request("otp-cache-v1", "GET https://app/other")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_cache_names_and_delete() {
        let storage = SqliteCacheStorage::in_memory().await.unwrap();

        storage.put_all("old", vec![]).await.unwrap();
        storage
            .put_all("new", vec![("GET /".to_string(), response("x"))])
            .await
            .unwrap();

        assert_eq!(storage.cache_names().await.unwrap(), vec!["new", "old"]);

        assert!(storage.delete_cache("old").await.unwrap());
        assert!(!storage.delete_cache("old").await.unwrap());
        assert_eq!(storage.cache_names().await.unwrap(), vec!["new"]);
    }

    #[tokio::test]
    async fn test_delete_cache_drops_entries() {
        let storage = SqliteCacheStorage::in_memory().await.unwrap();

        storage.put("c", "GET /a", response("a")).await.unwrap();
        storage.delete_cache("c").await.unwrap();

        assert!(storage.match_request("c", "GET /a").await.unwrap().is_none());
    }
}
