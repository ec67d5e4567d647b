//! Embedded third-party player bridge.
//!
//! The video-platform player is delivered as an external script that, once
//! loaded, can instantiate a player object bound to a reserved page region.
//! The player reports readiness, numeric state changes and errors through
//! callbacks; hosts forward those into a broadcast channel.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::{error::Result, platform::PlatformSendSync};

/// Vendor state code for "ended".
pub const EMBED_STATE_ENDED: i32 = 0;
/// Vendor state code for "playing".
pub const EMBED_STATE_PLAYING: i32 = 1;
/// Vendor state code for "paused".
pub const EMBED_STATE_PAUSED: i32 = 2;

/// Raw notifications from the embedded player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedPlayerEvent {
    /// The player finished initializing and accepts commands.
    Ready,
    /// Vendor state code (see the `EMBED_STATE_*` constants). Codes not listed
    /// there (buffering, cued, unstarted) are passed through untouched.
    StateChange(i32),
    /// Vendor error code.
    Error(i32),
}

/// Construction parameters for the player instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedPlayerOptions {
    /// Id of the reserved, visually hidden region the player binds to.
    pub element_id: String,
    pub width: u32,
    pub height: u32,
    pub plays_inline: bool,
    pub controls: bool,
    pub related_videos: bool,
    pub modest_branding: bool,
    pub fullscreen: bool,
    pub annotations: bool,
    pub keyboard: bool,
    /// Origin of the hosting page, forwarded to the vendor.
    pub origin: Option<String>,
}

impl Default for EmbedPlayerOptions {
    fn default() -> Self {
        Self {
            element_id: "ytPlayer".to_string(),
            width: 160,
            height: 90,
            plays_inline: true,
            controls: false,
            related_videos: false,
            modest_branding: true,
            fullscreen: false,
            annotations: false,
            keyboard: false,
            origin: None,
        }
    }
}

/// Host side of the embedded player: script injection and instantiation.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait EmbedHost: PlatformSendSync {
    /// Inject the vendor script and resolve once the vendor API announces it
    /// is available. Callers guarantee this runs at most once.
    async fn load_api(&self, script_src: &str) -> Result<()>;

    /// Instantiate the player. Called once per application lifetime.
    fn create_player(&self, options: &EmbedPlayerOptions) -> Result<Arc<dyn EmbedPlayer>>;
}

/// A live embedded player instance.
pub trait EmbedPlayer: PlatformSendSync {
    /// Whether the player has reported readiness and accepts commands.
    fn is_ready(&self) -> bool;

    /// Queue a content id for playback.
    fn load_by_id(&self, content_id: &str) -> Result<()>;

    /// Start playback of the loaded content.
    fn start(&self) -> Result<()>;

    /// Stop playback.
    fn stop(&self) -> Result<()>;

    /// Subscribe to player notifications.
    fn subscribe(&self) -> broadcast::Receiver<EmbedPlayerEvent>;
}
