//! # Playback Error Types
//!
//! Failures surfaced by backend adapters and the playback controller.

use bridge_traits::error::BridgeError;
use core_library::SourceKind;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Policy
    // ========================================================================
    /// Network-dependent source requested while offline. No backend was touched.
    #[error("{kind} sources cannot play while offline")]
    OfflinePolicyViolation { kind: SourceKind },

    // ========================================================================
    // Source resolution
    // ========================================================================
    /// The blob store could not be opened.
    #[error("Blob store unavailable: {0}")]
    StoreUnavailable(String),

    /// An imported record's blob is gone.
    #[error("Imported audio missing from store: {key}")]
    MissingBlob { key: String },

    /// The backend could not resolve or load the source.
    #[error("Failed to load {kind} source: {message}")]
    LoadError { kind: SourceKind, message: String },

    // ========================================================================
    // Playback control
    // ========================================================================
    /// The host refused to start playback.
    #[error("Failed to play {kind} source: {message}")]
    PlayError { kind: SourceKind, message: String },

    /// The embedded player did not become ready in time.
    #[error("Embedded player not ready after {waited_ms} ms")]
    NotReady { waited_ms: u64 },

    /// A newer play or stop overtook this request.
    #[error("Playback request superseded")]
    Superseded,

    /// No registered backend handles this kind.
    #[error("No backend registered for {kind} sources")]
    NoBackend { kind: SourceKind },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Invalid playback configuration: {0}")]
    Config(String),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Refused by the offline gate before any backend ran.
    pub fn is_policy_refusal(&self) -> bool {
        matches!(self, PlaybackError::OfflinePolicyViolation { .. })
    }

    /// Whether the user should be told about this outcome. A superseded play
    /// is silent: whatever overtook it reports its own result.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, PlaybackError::Superseded)
    }

    /// Message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            PlaybackError::OfflinePolicyViolation { .. } => {
                "You are offline, so this source cannot play. Local sources still work.".to_string()
            }
            PlaybackError::StoreUnavailable(_) => {
                "On-device storage is unavailable, so imported audio cannot be read.".to_string()
            }
            PlaybackError::MissingBlob { .. } => {
                "The imported audio could not be found. It may have been cleared from storage."
                    .to_string()
            }
            PlaybackError::LoadError {
                kind: SourceKind::Embedded,
                ..
            } => "Could not load this YouTube source.".to_string(),
            PlaybackError::PlayError {
                kind: SourceKind::Direct,
                ..
            } => "This URL cannot be played (likely CORS, format or server restrictions). Direct .mp3 links work best."
                .to_string(),
            PlaybackError::PlayError {
                kind: SourceKind::Embedded,
                ..
            } => "Failed to start YouTube playback.".to_string(),
            PlaybackError::NotReady { .. } => {
                "The YouTube player was not ready in time. Check your connection and try again."
                    .to_string()
            }
            PlaybackError::LoadError { .. } | PlaybackError::PlayError { .. } => {
                "Playback failed.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
