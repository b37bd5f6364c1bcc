//! Storage layer and lifecycle manager for card keys.
//!
//! This crate provides persistent storage for card key records and the
//! redemption log, plus [`CardKeyLifecycle`], which implements generation,
//! validation, redemption and listing on top of any [`Store`].
//!
//! # Architecture
//!
//! The `RocksDB` backend uses the following column families:
//!
//! - `cards`: card key records, keyed by the card key string
//! - `cards_by_issue`: index of card keys in issuance order
//! - `redemptions`: redemption log, keyed by `redemption_id` (ULID)
//! - `meta`: the issuance sequence counter
//!
//! Redemption runs in a pessimistic `TransactionDB` transaction:
//! `get_for_update` takes the per-key lock, so the check and the write are a
//! single step with respect to other redemptions of the same key.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cardkey_core::GenerateRequest;
//! use cardkey_store::{CardKeyLifecycle, MemoryStore, Redemption};
//!
//! let lifecycle = CardKeyLifecycle::new(Arc::new(MemoryStore::new()));
//!
//! let keys = lifecycle
//!     .generate(&GenerateRequest::new("VIP", 3, 30).normalize())
//!     .unwrap();
//!
//! let outcome = lifecycle.redeem(keys[0].as_str(), "abc123").unwrap();
//! assert!(matches!(outcome, Redemption::Redeemed(_)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod lifecycle;
pub mod memory;

#[cfg(feature = "rocksdb-backend")]
pub mod keys;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

pub use error::{Result, StoreError};
pub use lifecycle::{CardKeyLifecycle, Redemption, Validation};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use chrono::{DateTime, Utc};

use cardkey_core::{CardKey, CardKeyRecord, RedemptionRecord};

/// The storage trait defining all database operations.
///
/// Implementations own the record set exclusively. Reads never wait on a
/// redemption in progress for longer than it takes to copy a record.
pub trait Store: Send + Sync {
    // =========================================================================
    // Card Operations
    // =========================================================================

    /// Insert a batch of new records, all or nothing.
    ///
    /// Records are appended to the issuance order in slice order.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateKey` if any key already exists or appears twice
    ///   in the batch; nothing is written.
    /// - `StoreError::Database` if the write fails.
    fn insert_cards(&self, records: &[CardKeyRecord]) -> Result<()>;

    /// Get a record by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_card(&self, key: &CardKey) -> Result<Option<CardKeyRecord>>;

    /// Check whether a key has been issued.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn contains_card(&self, key: &CardKey) -> Result<bool> {
        Ok(self.get_card(key)?.is_some())
    }

    /// Count issued keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn card_count(&self) -> Result<usize>;

    /// List every record in issuance order.
    ///
    /// Each record is a point-in-time snapshot; the list as a whole is not.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_cards(&self) -> Result<Vec<CardKeyRecord>>;

    // =========================================================================
    // Redemption Operations
    // =========================================================================

    /// Redeem a key: the atomic conditional update.
    ///
    /// If the record exists, is unused and has not expired at `now`, it is
    /// marked used with `token` bound and a redemption log entry is appended,
    /// in one step with respect to every other redemption of the same key.
    ///
    /// # Errors
    ///
    /// - `StoreError::Rejected` with `NotFound`, `AlreadyUsed`, `Expired` or
    ///   `EmptyToken`; nothing is written.
    /// - `StoreError::Database` if the write fails.
    fn redeem_card(
        &self,
        key: &CardKey,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RedemptionRecord>;

    /// List redemption log entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_redemptions(&self, limit: usize, offset: usize) -> Result<Vec<RedemptionRecord>>;
}
