//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `BlobStore`, `SettingsStore` and `CacheStorage` backed by SQLite
//! - `HttpClient` using `reqwest`
//! - `NetworkMonitor` with a cached status, host overrides and a TCP reachability check
//! - In-memory variants of the three stores for tests and ephemeral sessions
//!
//! The media element and embedded player have no desktop implementation
//! here; hosts that render audio supply their own.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{SqliteBlobStore, SqliteSettingsStore, DesktopNetworkMonitor};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let dir = std::path::PathBuf::from("./profile");
//!     let blobs = SqliteBlobStore::new(dir.join("files.db")).await?;
//!     let settings = SqliteSettingsStore::new(dir.join("settings.db")).await?;
//!     let network = DesktopNetworkMonitor::new();
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod blob_store;
mod cache_storage;
mod http;
mod memory;
mod network;
mod settings;
mod sqlite;

pub use blob_store::SqliteBlobStore;
pub use cache_storage::SqliteCacheStorage;
pub use http::ReqwestHttpClient;
pub use memory::{MemoryBlobStore, MemoryCacheStorage, MemorySettingsStore};
pub use network::DesktopNetworkMonitor;
pub use settings::SqliteSettingsStore;
