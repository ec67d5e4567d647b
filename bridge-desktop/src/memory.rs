//! In-memory bridge implementations.
//!
//! Used by tests and by hosts that run without a writable profile directory.
//! Nothing here survives a restart.

use async_trait::async_trait;
use bridge_traits::{
    cache::CacheStorage,
    error::{BridgeError, Result},
    http::HttpResponse,
    storage::{BlobStore, SettingsStore},
};
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// In-memory [`BlobStore`].
///
/// Can be switched to "unavailable" to reproduce a store that failed to open
/// (quota exhausted, private browsing).
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
    unavailable: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails with `NotAvailable`.
    pub fn unavailable() -> Self {
        let store = Self::default();
        store.set_available(false);
        store
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of stored blobs.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(BridgeError::NotAvailable(
                "blob store could not be opened".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.check()?;
        self.blobs.write().await.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.check()?;
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check()?;
        self.blobs.write().await.remove(key);
        Ok(())
    }
}

/// In-memory [`SettingsStore`].
#[derive(Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. with a previously persisted collection.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut values = HashMap::new();
        values.insert(key.into(), value.into());
        Self {
            values: RwLock::new(values),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

/// In-memory [`CacheStorage`].
#[derive(Default)]
pub struct MemoryCacheStorage {
    caches: RwLock<BTreeMap<String, HashMap<String, HttpResponse>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn match_request(&self, cache: &str, key: &str) -> Result<Option<HttpResponse>> {
        Ok(self
            .caches
            .read()
            .await
            .get(cache)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(&self, cache: &str, key: &str, response: HttpResponse) -> Result<()> {
        self.caches
            .write()
            .await
            .entry(cache.to_string())
            .or_default()
            .insert(key.to_string(), response);
        Ok(())
    }

    async fn put_all(&self, cache: &str, entries: Vec<(String, HttpResponse)>) -> Result<()> {
        let mut caches = self.caches.write().await;
        let target = caches.entry(cache.to_string()).or_default();
        target.extend(entries);
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>> {
        Ok(self.caches.read().await.keys().cloned().collect())
    }

    async fn delete_cache(&self, cache: &str) -> Result<bool> {
        Ok(self.caches.write().await.remove(cache).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_blob_store_fails_every_call() {
        let store = MemoryBlobStore::unavailable();

        let err = store.put("k", Bytes::from_static(b"x")).await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(store.get("k").await.unwrap_err().is_unavailable());
        assert!(store.delete("k").await.unwrap_err().is_unavailable());

        store.set_available(true);
        store.put("k", Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_settings_seed() {
        let store = MemorySettingsStore::with_value("otp_state_v1", "garbage");
        assert_eq!(
            store.get_string("otp_state_v1").await.unwrap().as_deref(),
            Some("garbage")
        );
    }

    #[tokio::test]
    async fn test_cache_names_sorted() {
        let storage = MemoryCacheStorage::new();
        storage.put_all("b", vec![]).await.unwrap();
        storage.put_all("a", vec![]).await.unwrap();
        assert_eq!(storage.cache_names().await.unwrap(), vec!["a", "b"]);
    }
}
