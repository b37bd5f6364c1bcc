//! Error types for card key storage.

use cardkey_core::{CardKey, CardKeyError, Rejection};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A per-key lock could not be acquired in time.
    #[error("lock conflict: {0}")]
    Conflict(String),

    /// A conditional update found the record in the wrong state.
    #[error("{0}")]
    Rejected(Rejection),

    /// A batch insert hit a key that already exists.
    #[error("duplicate card key: {key}")]
    DuplicateKey {
        /// The key that was already issued.
        key: CardKey,
    },
}

impl From<Rejection> for StoreError {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl From<StoreError> for CardKeyError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}
