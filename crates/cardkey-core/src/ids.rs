//! Identifier types for the card key service.
//!
//! This module provides strongly-typed identifiers for card keys and redemptions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// A card key string such as `VIP-7QK2M9XA4T0BZC1D`.
///
/// Parsing trims surrounding whitespace and rejects empty input. Any other
/// string is accepted: an unknown key is a lookup miss, not a parse failure.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardKey(String);

impl CardKey {
    /// Parse user input into a `CardKey`.
    ///
    /// # Errors
    ///
    /// Returns `IdError::EmptyCardKey` if the input is empty after trimming.
    pub fn parse(input: &str) -> Result<Self, IdError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(IdError::EmptyCardKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Build a key from a prefix and a freshly drawn suffix.
    pub(crate) fn from_parts(prefix: &str, suffix: &str) -> Self {
        Self(format!("{prefix}-{suffix}"))
    }

    /// Return the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the bytes of the key.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Return the prefix part (everything before the last dash), if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.0.rsplit_once('-').map(|(prefix, _)| prefix)
    }
}

impl FromStr for CardKey {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardKey({})", self.0)
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CardKey {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CardKey> for String {
    fn from(key: CardKey) -> Self {
        key.0
    }
}

impl AsRef<[u8]> for CardKey {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// A redemption identifier using ULID for time-ordering.
///
/// Redemption IDs sort chronologically, which keeps the redemption log in
/// commit order without a separate index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RedemptionId(Ulid);

impl RedemptionId {
    /// Generate a new `RedemptionId` with the current timestamp.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Return the bytes of the ULID (16 bytes).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_bytes()
    }

    /// Create a `RedemptionId` from bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Ulid::from_bytes(bytes))
    }
}

impl FromStr for RedemptionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = Ulid::from_string(s).map_err(|_| IdError::InvalidUlid)?;
        Ok(Self(ulid))
    }
}

impl fmt::Debug for RedemptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedemptionId({})", self.0)
    }
}

impl fmt::Display for RedemptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RedemptionId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RedemptionId> for String {
    fn from(id: RedemptionId) -> Self {
        id.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The card key is empty after trimming.
    #[error("card key must not be empty")]
    EmptyCardKey,

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_key_parse_trims() {
        let key = CardKey::parse("  VIP-ABC123  ").unwrap();
        assert_eq!(key.as_str(), "VIP-ABC123");
    }

    #[test]
    fn card_key_rejects_blank() {
        assert_eq!(CardKey::parse(""), Err(IdError::EmptyCardKey));
        assert_eq!(CardKey::parse(" \t\n"), Err(IdError::EmptyCardKey));
    }

    #[test]
    fn card_key_prefix_uses_last_dash() {
        let key = CardKey::parse("TEAM-A-0123456789ABCDEF").unwrap();
        assert_eq!(key.prefix(), Some("TEAM-A"));

        let bare = CardKey::parse("NODASH").unwrap();
        assert_eq!(bare.prefix(), None);
    }

    #[test]
    fn card_key_serde_rejects_empty() {
        let parsed: Result<CardKey, _> = serde_json::from_str("\"   \"");
        assert!(parsed.is_err());

        let key: CardKey = serde_json::from_str("\"VIP-X\"").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"VIP-X\"");
    }

    #[test]
    fn redemption_id_roundtrip() {
        let id = RedemptionId::generate();
        let parsed = RedemptionId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert_eq!(RedemptionId::from_bytes(id.to_bytes()), id);
    }

    #[test]
    fn redemption_id_rejects_garbage() {
        assert_eq!(
            RedemptionId::from_str("not-a-ulid"),
            Err(IdError::InvalidUlid)
        );
    }
}
