//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (settings and blob
//! stores, reachability, media element, embedded player host) into the
//! source collection and the playback controller. Desktop hosts typically
//! enable the `desktop-shims` feature, which lets [`CoreConfig`] fall back to
//! the SQLite stores and the desktop network monitor from `bridge-desktop`.

pub mod error;
pub mod notice;
pub mod service;

pub use error::{CoreError, Result};
pub use notice::{Notice, Severity};
pub use service::PlayerService;

pub use core_playback::PlaybackConfig;
pub use core_runtime::config::{CoreConfig, CoreConfigBuilder, FeatureFlags};

#[cfg(feature = "offline-shell")]
pub use core_offline::{CacheRouter, ShellCacheConfig};

/// Build a [`PlayerService`] from a configured builder.
///
/// ```ignore
/// let service = core_service::bootstrap(
///     CoreConfig::builder()
///         .data_dir("/var/lib/onetap")
///         .media_element(audio)
///         .object_urls(urls)
///         .embed_host(host),
///     PlaybackConfig::default(),
/// )
/// .await?;
/// let notice = service.toggle().await?;
/// ```
pub async fn bootstrap(builder: CoreConfigBuilder, playback: PlaybackConfig) -> Result<PlayerService> {
    let config = builder.build()?;
    PlayerService::start(config, playback).await
}
