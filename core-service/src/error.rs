use core_library::LibraryError;
use core_playback::PlaybackError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// The blob store rejected an import. Nothing was added.
    #[error("Blob store unavailable: {0}")]
    StoreUnavailable(String),

    #[cfg(feature = "offline-shell")]
    #[error("Shell cache error: {0}")]
    Shell(#[from] core_offline::CacheRouterError),
}

impl CoreError {
    /// Whether a host should show this failure. Superseded plays are silent.
    pub fn is_user_facing(&self) -> bool {
        match self {
            CoreError::Playback(e) => e.is_user_facing(),
            _ => true,
        }
    }

    /// Refusals the user can fix themselves (bad input, offline, slow network).
    pub fn is_warning(&self) -> bool {
        match self {
            CoreError::Library(e) => matches!(
                e,
                LibraryError::EmptyUrl | LibraryError::BuiltinProtected
            ),
            CoreError::Playback(e) => {
                e.is_policy_refusal() || matches!(e, PlaybackError::NotReady { .. })
            }
            _ => false,
        }
    }

    /// Message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Library(LibraryError::EmptyUrl) => "Enter a URL.".to_string(),
            CoreError::Library(LibraryError::ClassificationRejected { .. }) => {
                "This URL is not supported. Use a direct .mp3 link or a YouTube URL.".to_string()
            }
            CoreError::Library(LibraryError::BuiltinProtected) => {
                "The sample cannot be removed.".to_string()
            }
            CoreError::Library(LibraryError::NotFound { .. }) => {
                "That source no longer exists.".to_string()
            }
            CoreError::Library(_) => "Could not save your sources.".to_string(),
            CoreError::Playback(e) => e.user_message(),
            CoreError::StoreUnavailable(_) => "Could not save the local audio.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
