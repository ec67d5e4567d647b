//! # Host Bridge Traits
//!
//! Capabilities the OneTap player core needs from its host but cannot
//! implement portably.
//!
//! ## Traits
//!
//! ### Storage
//! - [`BlobStore`](storage::BlobStore) - Durable binary store for imported audio
//! - [`SettingsStore`](storage::SettingsStore) - Key-value store for the serialized collection
//! - [`CacheStorage`](cache::CacheStorage) - Named response caches for the offline app shell
//!
//! ### Playback
//! - [`MediaElement`](media::MediaElement) - The single host audio element
//! - [`ObjectUrlRegistry`](media::ObjectUrlRegistry) - Temporary references to in-memory bytes
//! - [`EmbedHost`](embed::EmbedHost) / [`EmbedPlayer`](embed::EmbedPlayer) - Embedded video-platform player
//!
//! ### Platform Integration
//! - [`NetworkMonitor`](network::NetworkMonitor) - Online/offline signal and change events
//! - [`HttpClient`](http::HttpClient) - Network fetches for the cache router
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](log::LoggerSink) - Mirror core log events into the host's log
//!
//! ## Fail-Fast Strategy
//!
//! The core refuses to start when a required capability is missing:
//!
//! ```ignore
//! let blob_store = config.blob_store
//!     .ok_or_else(|| CoreError::CapabilityMissing {
//!         capability: "BlobStore".to_string(),
//!         message: "No blob store provided. Desktop: use SqliteBlobStore.".to_string(),
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits report failures as [`BridgeError`](error::BridgeError).
//! A store that cannot be opened at all must answer
//! [`BridgeError::NotAvailable`](error::BridgeError::NotAvailable).
//!
//! ## Thread Safety
//!
//! Traits are `Send + Sync` on native targets and unbounded on `wasm32`
//! (see [`platform`]).

pub mod cache;
pub mod embed;
pub mod error;
pub mod http;
pub mod log;
pub mod media;
pub mod network;
pub mod platform;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use cache::CacheStorage;
pub use embed::{
    EmbedHost, EmbedPlayer, EmbedPlayerEvent, EmbedPlayerOptions, EMBED_STATE_ENDED,
    EMBED_STATE_PAUSED, EMBED_STATE_PLAYING,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use log::{LogEntry, LogLevel, LoggerSink};
pub use media::{CrossOrigin, MediaElement, MediaElementOptions, MediaEvent, ObjectUrlRegistry, Preload};
pub use network::{NetworkChangeStream, NetworkMonitor, NetworkStatus};
pub use platform::{PlatformSend, PlatformSendSync};
pub use storage::{BlobStore, SettingsStore};
pub use time::{Clock, SystemClock};
