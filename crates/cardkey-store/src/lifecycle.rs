//! Card key lifecycle: generation, validation, redemption and listing.
//!
//! Every operation re-reads the store. Validation is advisory; redemption
//! re-checks every precondition inside the store's atomic conditional update
//! and never relies on an earlier validation.

use std::sync::Arc;

use chrono::Utc;

use cardkey_core::{
    BatchSpec, CardKey, CardKeyError, CardKeyRecord, KeyGenerator, RedemptionRecord, Rejection,
    Result,
};

use crate::{Store, StoreError};

/// Whole-batch attempts when a concurrent batch claims one of our keys first.
const GENERATION_ATTEMPTS: usize = 3;

/// Outcome of a validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The key could be redeemed right now. Carries the record snapshot.
    Valid(CardKeyRecord),
    /// The key cannot be redeemed.
    Invalid(Rejection),
}

impl Validation {
    /// Whether the key was valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The rejection, if invalid.
    #[must_use]
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(rejection) => Some(*rejection),
        }
    }
}

/// Outcome of a redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    /// The key is now bound to the token.
    Redeemed(RedemptionRecord),
    /// Nothing changed.
    Rejected(Rejection),
}

impl Redemption {
    /// Whether this call won the key.
    #[must_use]
    pub fn is_redeemed(&self) -> bool {
        matches!(self, Self::Redeemed(_))
    }

    /// The rejection, if rejected.
    #[must_use]
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Redeemed(_) => None,
            Self::Rejected(rejection) => Some(*rejection),
        }
    }
}

/// The card key lifecycle manager.
#[derive(Clone)]
pub struct CardKeyLifecycle {
    store: Arc<dyn Store>,
    generator: KeyGenerator,
}

impl CardKeyLifecycle {
    /// Create a lifecycle manager over `store` with the default generator.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            generator: KeyGenerator::new(),
        }
    }

    /// Replace the key generator.
    #[must_use]
    pub fn with_generator(mut self, generator: KeyGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Generate and persist a batch of keys.
    ///
    /// The batch commits as a whole or not at all. Returns the new keys in
    /// issuance order.
    ///
    /// # Errors
    ///
    /// Returns `CardKeyError::GenerationFailure` if the store is unavailable or
    /// the batch keeps colliding with concurrently issued keys.
    pub fn generate(&self, spec: &BatchSpec) -> Result<Vec<CardKey>> {
        for attempt in 1..=GENERATION_ATTEMPTS {
            let issued_at = Utc::now();
            let expires_at = spec.expires_at(issued_at);

            let keys = self.generator.draw_batch(spec, |candidate| {
                self.store
                    .contains_card(candidate)
                    .map_err(|e| CardKeyError::GenerationFailure(e.to_string()))
            })?;

            let records: Vec<_> = keys
                .iter()
                .map(|key| CardKeyRecord::issue(key.clone(), issued_at, expires_at))
                .collect();

            match self.store.insert_cards(&records) {
                Ok(()) => {
                    tracing::info!(
                        prefix = %spec.prefix,
                        count = keys.len(),
                        valid_days = spec.valid_days,
                        "Card keys issued"
                    );
                    return Ok(keys);
                }
                Err(StoreError::DuplicateKey { key }) => {
                    tracing::warn!(
                        attempt,
                        card_key = %key,
                        "Batch collided with an issued key, redrawing"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Batch insert failed");
                    return Err(CardKeyError::GenerationFailure(e.to_string()));
                }
            }
        }

        Err(CardKeyError::GenerationFailure(format!(
            "batch collided with issued keys {GENERATION_ATTEMPTS} times"
        )))
    }

    /// Check whether `card_key` is valid right now. Never mutates.
    ///
    /// Expiry is reported ahead of use, so a used key that has since expired
    /// is `Expired`.
    ///
    /// # Errors
    ///
    /// Returns `CardKeyError::Storage` if the store read fails.
    pub fn validate(&self, card_key: &str) -> Result<Validation> {
        let Ok(key) = CardKey::parse(card_key) else {
            return Ok(Validation::Invalid(Rejection::EmptyKey));
        };

        let Some(record) = self.store.get_card(&key)? else {
            tracing::debug!(card_key = %key, "Validation: not found");
            return Ok(Validation::Invalid(Rejection::NotFound));
        };

        match record.check_valid(Utc::now()) {
            Ok(()) => Ok(Validation::Valid(record)),
            Err(rejection) => {
                tracing::debug!(card_key = %key, reason = rejection.code(), "Validation failed");
                Ok(Validation::Invalid(rejection))
            }
        }
    }

    /// Bind `token` to `card_key`, once.
    ///
    /// Input is checked before the store is touched; everything else is
    /// decided inside the store's atomic conditional update.
    ///
    /// # Errors
    ///
    /// Returns `CardKeyError::Storage` if the store fails. Rejections are
    /// returned as `Ok(Redemption::Rejected(_))`.
    pub fn redeem(&self, card_key: &str, token: &str) -> Result<Redemption> {
        let Ok(key) = CardKey::parse(card_key) else {
            return Ok(Redemption::Rejected(Rejection::EmptyKey));
        };

        let token = token.trim();
        if token.is_empty() {
            return Ok(Redemption::Rejected(Rejection::EmptyToken));
        }

        match self.store.redeem_card(&key, token, Utc::now()) {
            Ok(redemption) => {
                tracing::info!(
                    card_key = %key,
                    redemption_id = %redemption.id,
                    "Card key redeemed"
                );
                Ok(Redemption::Redeemed(redemption))
            }
            Err(StoreError::Rejected(rejection)) => {
                tracing::debug!(card_key = %key, reason = rejection.code(), "Redemption rejected");
                Ok(Redemption::Rejected(rejection))
            }
            Err(e) => {
                tracing::error!(card_key = %key, error = %e, "Redemption failed");
                Err(e.into())
            }
        }
    }

    /// List every record in issuance order.
    ///
    /// # Errors
    ///
    /// Returns `CardKeyError::Storage` if the store read fails.
    pub fn list_all(&self) -> Result<Vec<CardKeyRecord>> {
        Ok(self.store.list_cards()?)
    }

    /// List redemption log entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CardKeyError::Storage` if the store read fails.
    pub fn list_redemptions(&self, limit: usize, offset: usize) -> Result<Vec<RedemptionRecord>> {
        Ok(self.store.list_redemptions(limit, offset)?)
    }
}
