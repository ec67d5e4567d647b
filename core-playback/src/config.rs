//! # Playback Configuration
//!
//! Settings for the media element and the embedded player adapter.

use bridge_traits::{embed::EmbedPlayerOptions, media::MediaElementOptions};
use core_library::BUILTIN_PATH;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Script that bootstraps the embedded player API.
    ///
    /// Default: the YouTube IFrame API.
    #[serde(default = "default_embed_script_url")]
    pub embed_script_url: String,

    /// How long `start` waits for the embedded player to become ready.
    ///
    /// Default: 3000 ms.
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    /// Readiness poll interval. Readiness callbacks are not guaranteed to
    /// fire promptly, so the adapter polls.
    ///
    /// Default: 50 ms.
    #[serde(default = "default_ready_poll_interval_ms")]
    pub ready_poll_interval_ms: u64,

    /// Bundled resource used when a bundled locator carries no path.
    #[serde(default = "default_builtin_path")]
    pub builtin_path: String,

    /// Options applied to the media element once at construction.
    #[serde(default)]
    pub media: MediaElementOptions,

    /// Embedded player construction parameters.
    #[serde(default)]
    pub embed_player: EmbedPlayerOptions,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            embed_script_url: default_embed_script_url(),
            ready_timeout_ms: default_ready_timeout_ms(),
            ready_poll_interval_ms: default_ready_poll_interval_ms(),
            builtin_path: default_builtin_path(),
            media: MediaElementOptions::default(),
            embed_player: EmbedPlayerOptions::default(),
        }
    }
}

impl PlaybackConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ready_poll_interval_ms)
    }

    /// Set the origin forwarded to the embedded player.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.embed_player.origin = Some(origin.into());
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.embed_script_url.trim().is_empty() {
            return Err("embed_script_url cannot be empty".to_string());
        }

        if self.ready_timeout_ms == 0 {
            return Err("ready_timeout_ms must be > 0".to_string());
        }

        if self.ready_poll_interval_ms == 0 {
            return Err("ready_poll_interval_ms must be > 0".to_string());
        }

        if self.ready_poll_interval_ms > self.ready_timeout_ms {
            return Err("ready_poll_interval_ms cannot exceed ready_timeout_ms".to_string());
        }

        if self.embed_player.element_id.trim().is_empty() {
            return Err("embed_player.element_id cannot be empty".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_embed_script_url() -> String {
    "https://www.youtube.com/iframe_api".to_string()
}

fn default_ready_timeout_ms() -> u64 {
    3000
}

fn default_ready_poll_interval_ms() -> u64 {
    50
}

fn default_builtin_path() -> String {
    BUILTIN_PATH.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlaybackConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ready_timeout(), Duration::from_millis(3000));
        assert_eq!(config.ready_poll_interval(), Duration::from_millis(50));
        assert_eq!(config.embed_player.width, 160);
        assert_eq!(config.embed_player.height, 90);
        assert!(!config.embed_player.controls);
    }

    #[test]
    fn test_config_validation() {
        let mut config = PlaybackConfig::default();

        config.ready_timeout_ms = 0;
        assert!(config.validate().is_err());
        config.ready_timeout_ms = 3000;

        config.ready_poll_interval_ms = 5000;
        assert!(config.validate().is_err());
        config.ready_poll_interval_ms = 50;

        config.embed_script_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{"ready_timeout_ms": 1500}"#).unwrap();
        assert_eq!(config.ready_timeout_ms, 1500);
        assert_eq!(config.ready_poll_interval_ms, 50);
        assert_eq!(config.builtin_path, BUILTIN_PATH);

        let config = config.with_origin("https://app.example");
        assert_eq!(config.embed_player.origin.as_deref(), Some("https://app.example"));
    }
}
