//! Client error types.

use cardkey_core::Rejection;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the card key client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service refused to validate or redeem the key.
    #[error("rejected ({}): {message}", reason.code())]
    Rejected {
        /// Why the key was refused.
        reason: Rejection,
        /// Message from the service.
        message: String,
    },

    /// Server returned any other error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// The rejection reason, if the service refused the key.
    #[must_use]
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Rejected { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
