//! # Core Configuration Module
//!
//! Provides configuration management for the OneTap player core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all host capabilities and settings the core needs.
//! It enforces fail-fast validation so a host learns about a missing bridge at
//! startup rather than on the first tap.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - Persisted source collection
//! - `BlobStore` - Imported audio payloads
//! - `NetworkMonitor` - Reachability signal for the offline gate
//! - `MediaElement` - Audio output for Local and Direct sources
//! - `ObjectUrlRegistry` - Short-lived references to imported blobs
//! - `EmbedHost` - Embedded video-platform player
//!
//! ## Optional Dependencies
//!
//! - `Clock` - Timestamp source (default: `SystemClock`)
//! - `HttpClient` / `CacheStorage` - Only needed by the offline shell cache router
//! - `EventBus` - Created on demand when not shared by the host
//!
//! When the `desktop-shims` feature is enabled and a data directory is set,
//! SQLite-backed settings and blob stores, the desktop network monitor and the
//! reqwest HTTP client are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .settings_store(Arc::new(MySettingsStore))
//!     .blob_store(Arc::new(MyBlobStore))
//!     .network_monitor(Arc::new(MyNetworkMonitor))
//!     .media_element(Arc::new(MyAudioElement))
//!     .object_urls(Arc::new(MyObjectUrls))
//!     .embed_host(Arc::new(MyEmbedHost))
//!     .preload_embed_on_start(true)
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! Missing capabilities produce [`Error::CapabilityMissing`] with an actionable
//! message naming the bridge and how to provide it.

use crate::error::{Error, Result};
use crate::events::EventBus;
use bridge_traits::{
    BlobStore, CacheStorage, Clock, EmbedHost, HttpClient, MediaElement, NetworkMonitor,
    ObjectUrlRegistry, SettingsStore, SystemClock,
};
#[cfg(feature = "desktop-shims")]
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

/// Key under which the source collection is persisted.
pub const DEFAULT_STATE_KEY: &str = "otp_state_v1";

/// Core configuration for the OneTap player.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Directory for on-device databases (desktop defaults only)
    pub data_dir: Option<PathBuf>,

    /// Settings key holding the serialized source collection
    pub state_key: String,

    /// Source collection storage (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// Imported audio storage (required)
    pub blob_store: Arc<dyn BlobStore>,

    /// Reachability signal consulted by the offline gate (required)
    pub network_monitor: Arc<dyn NetworkMonitor>,

    /// Host audio element (required)
    pub media_element: Arc<dyn MediaElement>,

    /// Object URL registry for imported blobs (required)
    pub object_urls: Arc<dyn ObjectUrlRegistry>,

    /// Embedded player host (required)
    pub embed_host: Arc<dyn EmbedHost>,

    /// Timestamp source
    pub clock: Arc<dyn Clock>,

    /// HTTP client used by the shell cache router
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Response cache used by the shell cache router
    pub cache_storage: Option<Arc<dyn CacheStorage>>,

    /// Shared event bus
    pub event_bus: EventBus,

    /// Features flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("data_dir", &self.data_dir)
            .field("state_key", &self.state_key)
            .field("settings_store", &"SettingsStore { ... }")
            .field("blob_store", &"BlobStore { ... }")
            .field("network_monitor", &"NetworkMonitor { ... }")
            .field("media_element", &"MediaElement { ... }")
            .field("object_urls", &"ObjectUrlRegistry { ... }")
            .field("embed_host", &"EmbedHost { ... }")
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "cache_storage",
                &self.cache_storage.as_ref().map(|_| "CacheStorage { ... }"),
            )
            .field("event_bus", &self.event_bus)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Start loading the embedded player script as soon as the service starts
    pub preload_embed_on_start: bool,

    /// Start loading the embedded player script when an Embedded source is added
    pub preload_embed_on_add: bool,

    /// Route shell requests through the offline cache (requires HttpClient and CacheStorage)
    pub enable_offline_shell: bool,
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The state key is not blank
    /// - Feature flags are consistent with available bridges
    pub fn validate(&self) -> Result<()> {
        if self.state_key.trim().is_empty() {
            return Err(Error::Config("State key cannot be empty".to_string()));
        }

        if self.features.enable_offline_shell && self.http_client.is_none() {
            return Err(Error::Config(
                "Offline shell enabled but no HttpClient provided. \
                 Disable the feature or inject an HttpClient implementation."
                    .to_string(),
            ));
        }

        if self.features.enable_offline_shell && self.cache_storage.is_none() {
            return Err(Error::Config(
                "Offline shell enabled but no CacheStorage provided. \
                 Disable the feature or inject a CacheStorage implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn capability_missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    capability_missing(
        "SettingsStore",
        "SettingsStore implementation is required to persist the source collection. \
         Desktop: enable the 'desktop-shims' feature and set a data directory. \
         Web: inject a localStorage-based settings store.",
    )
}

#[cfg(not(feature = "desktop-shims"))]
fn blob_store_missing_error() -> Error {
    capability_missing(
        "BlobStore",
        "BlobStore implementation is required to keep imported audio. \
         Desktop: enable the 'desktop-shims' feature and set a data directory. \
         Web: inject an IndexedDB-based blob store.",
    )
}

#[cfg(not(feature = "desktop-shims"))]
fn network_monitor_missing_error() -> Error {
    capability_missing(
        "NetworkMonitor",
        "NetworkMonitor implementation is required by the offline gate. \
         Desktop: enable the 'desktop-shims' feature. \
         Web: inject a navigator.onLine-based monitor.",
    )
}

#[cfg(feature = "desktop-shims")]
fn data_dir_required(capability: &str, data_dir: Option<&Path>) -> Result<PathBuf> {
    data_dir.map(Path::to_path_buf).ok_or_else(|| {
        capability_missing(
            capability,
            "No implementation provided and no data directory set for the desktop default. \
             Use .data_dir() or inject an implementation.",
        )
    })
}

/// Run an async store constructor to completion from synchronous code,
/// whether or not a Tokio runtime is already driving this thread.
#[cfg(feature = "desktop-shims")]
fn block_on_store<T, F, Fut>(label: &str, init: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = bridge_traits::error::Result<T>>,
{
    use std::thread;
    use tokio::runtime::{Handle, Runtime};

    let label = label.to_string();
    let run = move || -> Result<T> {
        let runtime = Runtime::new().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default {}: {}",
                label, e
            ))
        })?;

        runtime
            .block_on(init())
            .map_err(|e| Error::Internal(format!("Failed to initialize default {}: {}", label, e)))
    };

    match Handle::try_current() {
        Ok(_) => thread::spawn(run).join().map_err(|_| {
            Error::Internal("Worker thread panicked while creating a default store".to_string())
        })?,
        Err(_) => run(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(data_dir: Option<&Path>) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;

    let path = data_dir_required("SettingsStore", data_dir)?.join("settings.db");
    let store = block_on_store("SettingsStore", move || SqliteSettingsStore::new(path))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_data_dir: Option<&std::path::Path>) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_blob_store(data_dir: Option<&Path>) -> Result<Arc<dyn BlobStore>> {
    use bridge_desktop::SqliteBlobStore;

    let path = data_dir_required("BlobStore", data_dir)?.join("files.db");
    let store = block_on_store("BlobStore", move || SqliteBlobStore::new(path))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_blob_store(_data_dir: Option<&std::path::Path>) -> Result<Arc<dyn BlobStore>> {
    Err(blob_store_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_network_monitor() -> Result<Arc<dyn NetworkMonitor>> {
    Ok(Arc::new(bridge_desktop::DesktopNetworkMonitor::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_network_monitor() -> Result<Arc<dyn NetworkMonitor>> {
    Err(network_monitor_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Option<Arc<dyn HttpClient>> {
    bridge_desktop::ReqwestHttpClient::new()
        .ok()
        .map(|client| Arc::new(client) as Arc<dyn HttpClient>)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Option<Arc<dyn HttpClient>> {
    None
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) once every required capability
/// is set.
#[derive(Default)]
pub struct CoreConfigBuilder {
    data_dir: Option<PathBuf>,
    state_key: Option<String>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    blob_store: Option<Arc<dyn BlobStore>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    media_element: Option<Arc<dyn MediaElement>>,
    object_urls: Option<Arc<dyn ObjectUrlRegistry>>,
    embed_host: Option<Arc<dyn EmbedHost>>,
    clock: Option<Arc<dyn Clock>>,
    http_client: Option<Arc<dyn HttpClient>>,
    cache_storage: Option<Arc<dyn CacheStorage>>,
    event_bus: Option<EventBus>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the directory used by desktop default stores.
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Overrides the persisted-state key.
    ///
    /// Default: `otp_state_v1`
    pub fn state_key(mut self, key: impl Into<String>) -> Self {
        self.state_key = Some(key.into());
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(store);
        self
    }

    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    pub fn media_element(mut self, element: Arc<dyn MediaElement>) -> Self {
        self.media_element = Some(element);
        self
    }

    pub fn object_urls(mut self, registry: Arc<dyn ObjectUrlRegistry>) -> Self {
        self.object_urls = Some(registry);
        self
    }

    pub fn embed_host(mut self, host: Arc<dyn EmbedHost>) -> Self {
        self.embed_host = Some(host);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn cache_storage(mut self, storage: Arc<dyn CacheStorage>) -> Self {
        self.cache_storage = Some(storage);
        self
    }

    /// Share an existing event bus instead of creating a new one.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn preload_embed_on_start(mut self, enabled: bool) -> Self {
        self.features.preload_embed_on_start = enabled;
        self
    }

    pub fn preload_embed_on_add(mut self, enabled: bool) -> Self {
        self.features.preload_embed_on_add = enabled;
        self
    }

    pub fn enable_offline_shell(mut self, enabled: bool) -> Self {
        self.features.enable_offline_shell = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge is absent and no
    ///   desktop default applies
    /// - [`Error::Config`] when validation fails
    pub fn build(self) -> Result<CoreConfig> {
        let data_dir = self.data_dir;

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(data_dir.as_deref())?,
        };

        let blob_store = match self.blob_store {
            Some(store) => store,
            None => provide_default_blob_store(data_dir.as_deref())?,
        };

        let network_monitor = match self.network_monitor {
            Some(monitor) => monitor,
            None => provide_default_network_monitor()?,
        };

        let media_element = self.media_element.ok_or_else(|| {
            capability_missing(
                "MediaElement",
                "MediaElement implementation is required to play Local and Direct sources. \
                 Web: wrap an HTMLAudioElement. Native: inject the host audio player.",
            )
        })?;

        let object_urls = self.object_urls.ok_or_else(|| {
            capability_missing(
                "ObjectUrlRegistry",
                "ObjectUrlRegistry implementation is required to play imported files. \
                 Web: wrap URL.createObjectURL/revokeObjectURL.",
            )
        })?;

        let embed_host = self.embed_host.ok_or_else(|| {
            capability_missing(
                "EmbedHost",
                "EmbedHost implementation is required to play Embedded sources. \
                 Web: load the video-platform iframe API into a hidden container.",
            )
        })?;

        let http_client = match self.http_client {
            Some(client) => Some(client),
            None if self.features.enable_offline_shell => provide_default_http_client(),
            None => None,
        };

        let config = CoreConfig {
            data_dir,
            state_key: self
                .state_key
                .unwrap_or_else(|| DEFAULT_STATE_KEY.to_string()),
            settings_store,
            blob_store,
            network_monitor,
            media_element,
            object_urls,
            embed_host,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            http_client,
            cache_storage: self.cache_storage,
            event_bus: self.event_bus.unwrap_or_default(),
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
