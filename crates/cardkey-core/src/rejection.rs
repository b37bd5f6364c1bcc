//! Reasons a card key cannot be validated or redeemed.

use serde::{Deserialize, Serialize};

/// Why a validate or redeem call did not succeed.
///
/// These are expected outcomes of normal and concurrent use, carried as values
/// through every layer so a caller can tell "already used" from "expired" from
/// "not found".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rejection {
    /// No record exists for the key.
    #[error("card key not found")]
    NotFound,

    /// The key has already been redeemed.
    #[error("card key has already been used")]
    AlreadyUsed,

    /// The key's expiry time has passed.
    #[error("card key has expired")]
    Expired,

    /// The submitted token is empty after trimming.
    #[error("token must not be empty")]
    EmptyToken,

    /// The submitted card key is empty after trimming.
    #[error("card key must not be empty")]
    EmptyKey,
}

impl Rejection {
    /// Every rejection, in a stable order.
    pub const ALL: [Self; 5] = [
        Self::NotFound,
        Self::AlreadyUsed,
        Self::Expired,
        Self::EmptyToken,
        Self::EmptyKey,
    ];

    /// Stable machine-readable code, as used on the wire.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyUsed => "ALREADY_USED",
            Self::Expired => "EXPIRED",
            Self::EmptyToken => "EMPTY_TOKEN",
            Self::EmptyKey => "EMPTY_KEY",
        }
    }

    /// Look up a rejection by its wire code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }

    /// Whether the rejection was decided from input alone, before any store read.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyToken | Self::EmptyKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip() {
        for rejection in Rejection::ALL {
            assert_eq!(Rejection::from_code(rejection.code()), Some(rejection));
        }
        assert_eq!(Rejection::from_code("SOMETHING_ELSE"), None);
    }

    #[test]
    fn serde_uses_wire_codes() {
        let json = serde_json::to_string(&Rejection::AlreadyUsed).unwrap();
        assert_eq!(json, "\"ALREADY_USED\"");
    }

    #[test]
    fn input_errors() {
        assert!(Rejection::EmptyKey.is_input_error());
        assert!(Rejection::EmptyToken.is_input_error());
        assert!(!Rejection::Expired.is_input_error());
    }
}
