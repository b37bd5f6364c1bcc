//! Error types for the card key service.

use crate::ids::IdError;

/// Result type for card key operations.
pub type Result<T> = std::result::Result<T, CardKeyError>;

/// Errors that can occur in card key operations.
///
/// These are operational failures. Reasons a particular key cannot be validated
/// or redeemed are expressed as [`crate::Rejection`] values instead.
#[derive(Debug, thiserror::Error)]
pub enum CardKeyError {
    /// A batch of keys could not be generated or committed.
    #[error("generation failure: {0}")]
    GenerationFailure(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl CardKeyError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::GenerationFailure(_) => "GENERATION_FAILURE",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::InvalidId(_) => "INVALID_ID",
        }
    }
}
