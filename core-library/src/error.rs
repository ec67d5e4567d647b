use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("No URL was provided")]
    EmptyUrl,

    #[error("Unsupported URL: {url}")]
    ClassificationRejected { url: String },

    #[error("The built-in source cannot be removed")]
    BuiltinProtected,

    #[error("Source not found: {id}")]
    NotFound { id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LibraryError {
    /// Refusals caused by user input rather than by storage.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            LibraryError::EmptyUrl
                | LibraryError::ClassificationRejected { .. }
                | LibraryError::BuiltinProtected
        )
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
