//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Card key records, keyed by the card key string.
    pub const CARDS: &str = "cards";

    /// Index: card keys in issuance order, keyed by a big-endian sequence number.
    /// Value is the card key.
    pub const CARDS_BY_ISSUE: &str = "cards_by_issue";

    /// Redemption log, keyed by `redemption_id` (ULID).
    pub const REDEMPTIONS: &str = "redemptions";

    /// Counters and other single-value metadata.
    pub const META: &str = "meta";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::CARDS, cf::CARDS_BY_ISSUE, cf::REDEMPTIONS, cf::META]
}
