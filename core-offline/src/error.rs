use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheRouterError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Shell install failed at '{path}': {reason}")]
    InstallFailed { path: String, reason: String },

    #[error("Network fetch failed for '{url}' and no cached copy exists: {source}")]
    Fetch {
        url: String,
        #[source]
        source: BridgeError,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CacheRouterError {
    /// Whether the failure came from the network rather than the cache or
    /// configuration.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            CacheRouterError::Fetch { .. } | CacheRouterError::InstallFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CacheRouterError>;
