use thiserror::Error;

/// Errors from blob store operations.
///
/// Only [`StoreError::NotFound`] means the object is absent; every other
/// variant is a transport, credential, or backend failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request throttled")]
    Throttled,

    #[error("request timed out")]
    Timeout,

    #[error("credential error: {0}")]
    Credential(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` if this error reports an absent object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
