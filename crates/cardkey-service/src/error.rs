//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use cardkey_core::{CardKeyError, Rejection};

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The key cannot be used; the reason is passed through to the caller.
    #[error("{0}")]
    Rejected(Rejection),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A batch could not be generated; the caller may retry.
    #[error("generation failure: {0}")]
    GenerationFailure(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
    reason: &'static str,
}

/// HTTP status for a rejection.
#[must_use]
pub fn rejection_status(rejection: Rejection) -> StatusCode {
    match rejection {
        Rejection::NotFound => StatusCode::NOT_FOUND,
        Rejection::AlreadyUsed => StatusCode::CONFLICT,
        Rejection::Expired => StatusCode::GONE,
        Rejection::EmptyToken | Rejection::EmptyKey => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason, detail) = match &self {
            Self::Rejected(rejection) => (
                rejection_status(*rejection),
                rejection.code(),
                rejection.to_string(),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            Self::GenerationFailure(msg) => {
                tracing::error!(error = %msg, "Card key generation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_FAILURE",
                    "Card key generation failed; no keys were issued, please retry".to_string(),
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { detail, reason })).into_response()
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl From<CardKeyError> for ApiError {
    fn from(err: CardKeyError) -> Self {
        match err {
            CardKeyError::GenerationFailure(msg) => Self::GenerationFailure(msg),
            CardKeyError::Storage(msg) => Self::Internal(msg),
            CardKeyError::InvalidId(e) => Self::BadRequest(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_statuses_are_distinct_per_reason() {
        assert_eq!(rejection_status(Rejection::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(rejection_status(Rejection::AlreadyUsed), StatusCode::CONFLICT);
        assert_eq!(rejection_status(Rejection::Expired), StatusCode::GONE);
        assert_eq!(
            rejection_status(Rejection::EmptyToken),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn storage_errors_become_internal() {
        let err = ApiError::from(CardKeyError::Storage("disk gone".into()));
        assert!(matches!(err, ApiError::Internal(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
