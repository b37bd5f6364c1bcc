//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in column families.

use cardkey_core::{CardKey, RedemptionId};

use crate::error::{Result, StoreError};

/// `meta` entry holding the next issuance sequence number.
pub const NEXT_ISSUE_SEQ: &[u8] = b"next_issue_seq";

/// Create a record key from a card key.
#[must_use]
pub fn card_key(key: &CardKey) -> Vec<u8> {
    key.as_bytes().to_vec()
}

/// Create an issuance index key.
///
/// Big-endian so that byte order matches numeric order.
#[must_use]
pub fn issue_key(seq: u64) -> [u8; 8] {
    seq.to_be_bytes()
}

/// Decode a sequence number written by [`issue_key`].
///
/// # Errors
///
/// Returns `StoreError::Serialization` if the value is not 8 bytes.
pub fn decode_seq(bytes: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Serialization(format!("bad sequence length {}", bytes.len())))?;
    Ok(u64::from_be_bytes(bytes))
}

/// Create a redemption key from a redemption ID.
///
/// Since ULIDs are time-ordered, the redemption log is sorted by commit time.
#[must_use]
pub fn redemption_key(id: &RedemptionId) -> [u8; 16] {
    id.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_keys_sort_numerically() {
        assert!(issue_key(9) < issue_key(10));
        assert!(issue_key(255) < issue_key(256));
    }

    #[test]
    fn sequence_decodes() {
        assert_eq!(decode_seq(&issue_key(42)).unwrap(), 42);
        assert!(decode_seq(b"short").is_err());
    }

    #[test]
    fn redemption_keys_are_ulid_bytes() {
        let id = RedemptionId::generate();
        assert_eq!(RedemptionId::from_bytes(redemption_key(&id)), id);
    }
}
