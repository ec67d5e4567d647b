//! Durable storage abstractions
//!
//! Two stores back the player:
//! - [`BlobStore`] keeps the raw bytes of imported audio files, one key per import.
//! - [`SettingsStore`] keeps small string values such as the serialized source collection.

use bytes::Bytes;

use crate::{error::Result, platform::PlatformSendSync};

/// Durable key → binary object store for imported audio.
///
/// Backed by an application-scoped on-device store that survives restarts and
/// works offline:
/// - Desktop: SQLite table
/// - Web: IndexedDB object store
///
/// Every operation is individually transactional; there are no multi-key
/// transactions. Writing an existing key replaces the value (last write wins).
///
/// # Failure mode
///
/// When the underlying store cannot be opened (quota exhausted, storage
/// disabled, private browsing) every call must fail with
/// [`BridgeError::NotAvailable`](crate::error::BridgeError::NotAvailable) so the
/// caller can abort the import instead of losing it silently.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::BlobStore;
///
/// async fn import(store: &dyn BlobStore, key: &str, bytes: bytes::Bytes) -> Result<()> {
///     store.put(key, bytes).await?;
///     Ok(())
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait BlobStore: PlatformSendSync {
    /// Store `data` under `key`, replacing any previous value.
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Fetch the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Remove `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a value exists without keeping it around.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Key-value settings storage trait
///
/// Abstracts platform-specific preferences storage:
/// - Desktop: SQLite-backed table
/// - Web: localStorage
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn save_state(store: &dyn SettingsStore, json: &str) -> Result<()> {
///     store.set_string("otp_state_v1", json).await
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait SettingsStore: PlatformSendSync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Delete a setting. Missing keys are ignored.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }
}
