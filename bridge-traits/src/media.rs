//! Media element bridge.
//!
//! Local and direct-URL sources both stream through one host media element
//! (an `HTMLAudioElement` on the web). The element's `play()` primitive is
//! asynchronous and may be rejected by the host for unsupported formats,
//! cross-origin denials or autoplay policy.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{error::Result, platform::PlatformSendSync};

/// Status notifications raised by the media element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// Audio output started.
    Playing,
    /// Playback paused, either by us or by the host (interruptions, headphones unplugged).
    Paused,
    /// The source played to its end.
    Ended,
    /// The element failed while loading or decoding.
    Error { message: String },
}

/// Preload hint for the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preload {
    None,
    Metadata,
    Auto,
}

/// CORS mode for fetching the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossOrigin {
    Anonymous,
    UseCredentials,
}

/// Options applied once when the element is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaElementOptions {
    pub preload: Preload,
    /// Play inline instead of entering a fullscreen player (iOS).
    pub plays_inline: bool,
    /// Only effective when the remote server allows it.
    pub cross_origin: Option<CrossOrigin>,
}

impl Default for MediaElementOptions {
    fn default() -> Self {
        Self {
            preload: Preload::Auto,
            plays_inline: true,
            cross_origin: Some(CrossOrigin::Anonymous),
        }
    }
}

/// A single host media element.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaElement: PlatformSendSync {
    /// Apply element-level options.
    fn configure(&self, options: &MediaElementOptions);

    /// Point the element at a new source URL.
    fn set_source(&self, src: &str);

    /// Reset the element and start fetching the current source.
    fn load(&self);

    /// Start playback. Resolves once audio is flowing, or fails with
    /// [`BridgeError::Rejected`](crate::error::BridgeError::Rejected) when the host refuses.
    async fn play(&self) -> Result<()>;

    /// Pause playback. Safe to call when nothing is loaded.
    fn pause(&self);

    /// Subscribe to element events.
    fn subscribe(&self) -> broadcast::Receiver<MediaEvent>;
}

/// Registry of short-lived local references to in-memory binary data
/// (`URL.createObjectURL` / `URL.revokeObjectURL` on the web).
pub trait ObjectUrlRegistry: PlatformSendSync {
    /// Wrap `data` into a reference the media element can load.
    fn create(&self, data: Bytes) -> Result<String>;

    /// Release a reference created by [`create`](ObjectUrlRegistry::create).
    fn revoke(&self, url: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_inline_anonymous_playback() {
        let options = MediaElementOptions::default();
        assert_eq!(options.preload, Preload::Auto);
        assert!(options.plays_inline);
        assert_eq!(options.cross_origin, Some(CrossOrigin::Anonymous));
    }
}
