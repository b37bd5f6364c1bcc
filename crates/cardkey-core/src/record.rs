//! Card key records and the redemption log entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CardKey, RedemptionId, Rejection};

/// Coarse status of a card key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    /// Issued and not yet redeemed.
    Unused,
    /// Redeemed; bound to a token.
    Used,
}

impl CardStatus {
    /// Lowercase name as shown to callers.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Used => "used",
        }
    }
}

/// Redemption state of a card key.
///
/// The token and the redemption time only exist in the `Used` variant, so a
/// record can never be "used without a token" or "unused with a token".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardState {
    /// Issued and not yet redeemed.
    Unused,
    /// Redeemed exactly once.
    Used {
        /// The token bound at redemption.
        token: String,
        /// When the redemption committed.
        used_at: DateTime<Utc>,
    },
}

/// A card key and its lifecycle state.
///
/// Fields are private: the only mutation is [`CardKeyRecord::redeem`], which
/// moves the record from `Unused` to `Used` once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardKeyRecord {
    key: CardKey,
    issued_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    state: CardState,
}

impl CardKeyRecord {
    /// Create a new, unused record.
    #[must_use]
    pub fn issue(
        key: CardKey,
        issued_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            key,
            issued_at,
            expires_at,
            state: CardState::Unused,
        }
    }

    /// The card key.
    #[must_use]
    pub fn key(&self) -> &CardKey {
        &self.key
    }

    /// When the key was issued.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// When the key expires, if ever.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Full redemption state.
    #[must_use]
    pub fn state(&self) -> &CardState {
        &self.state
    }

    /// Coarse status.
    #[must_use]
    pub fn status(&self) -> CardStatus {
        match self.state {
            CardState::Unused => CardStatus::Unused,
            CardState::Used { .. } => CardStatus::Used,
        }
    }

    /// The token bound at redemption, if redeemed.
    #[must_use]
    pub fn bound_token(&self) -> Option<&str> {
        match &self.state {
            CardState::Unused => None,
            CardState::Used { token, .. } => Some(token),
        }
    }

    /// When the key was redeemed, if redeemed.
    #[must_use]
    pub fn used_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            CardState::Unused => None,
            CardState::Used { used_at, .. } => Some(*used_at),
        }
    }

    /// Whether the key has expired at `now`. Expiry is inclusive.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Check whether the key is still valid at `now`, as reported by validation.
    ///
    /// Expiry applies regardless of status, so a key that was used and has
    /// since expired reports `Expired`.
    ///
    /// # Errors
    ///
    /// Returns `Rejection::Expired` or `Rejection::AlreadyUsed`.
    pub fn check_valid(&self, now: DateTime<Utc>) -> Result<(), Rejection> {
        if self.is_expired_at(now) {
            return Err(Rejection::Expired);
        }
        if self.status() == CardStatus::Used {
            return Err(Rejection::AlreadyUsed);
        }
        Ok(())
    }

    /// Check whether the key could be redeemed at `now`.
    ///
    /// A used key reports `AlreadyUsed` even when it has also expired since,
    /// so a repeated redemption always fails the same way.
    ///
    /// # Errors
    ///
    /// Returns `Rejection::AlreadyUsed` or `Rejection::Expired`.
    pub fn check_redeemable(&self, now: DateTime<Utc>) -> Result<(), Rejection> {
        if self.status() == CardStatus::Used {
            return Err(Rejection::AlreadyUsed);
        }
        if self.is_expired_at(now) {
            return Err(Rejection::Expired);
        }
        Ok(())
    }

    /// Bind `token` to this key, moving it to `Used`.
    ///
    /// The caller must hold whatever lock makes this read-check-write atomic
    /// for the key. On error the record is left untouched. Returns the
    /// recorded redemption time, which is never earlier than `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `Rejection::EmptyToken`, `Rejection::AlreadyUsed` or
    /// `Rejection::Expired`.
    pub fn redeem(
        &mut self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, Rejection> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Rejection::EmptyToken);
        }
        self.check_redeemable(now)?;

        let used_at = now.max(self.issued_at);
        self.state = CardState::Used {
            token: token.to_string(),
            used_at,
        };
        Ok(used_at)
    }
}

/// An entry in the redemption log.
///
/// Written in the same atomic step as the record's transition to `Used`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRecord {
    /// Unique redemption ID (ULID for time-ordering).
    pub id: RedemptionId,

    /// The redeemed key.
    pub card_key: CardKey,

    /// The token bound to the key.
    pub token: String,

    /// When the redemption committed.
    pub recorded_at: DateTime<Utc>,
}

impl RedemptionRecord {
    /// Build the log entry for a record that was just redeemed.
    ///
    /// Returns `None` if the record is still unused.
    #[must_use]
    pub fn for_record(record: &CardKeyRecord) -> Option<Self> {
        match record.state() {
            CardState::Unused => None,
            CardState::Used { token, used_at } => Some(Self {
                id: RedemptionId::generate(),
                card_key: record.key().clone(),
                token: token.clone(),
                recorded_at: *used_at,
            }),
        }
    }
}
