//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.
//! Writes go through pessimistic transactions on a `TransactionDB`; plain reads
//! go straight to the database and never take a transaction lock.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, ErrorKind, IteratorMode, MultiThreaded, Options,
    TransactionDB, TransactionDBOptions,
};

use cardkey_core::{CardKey, CardKeyRecord, RedemptionRecord, Rejection};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// How long a transaction waits for a per-key lock, in milliseconds.
const LOCK_TIMEOUT_MS: i64 = 2_000;

/// Attempts for a write that keeps hitting lock conflicts.
const MAX_CONFLICT_ATTEMPTS: usize = 5;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<TransactionDB<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let mut txn_opts = TransactionDBOptions::default();
        txn_opts.set_txn_lock_timeout(LOCK_TIMEOUT_MS);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = TransactionDB::open_cf_descriptors(&opts, &txn_opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn try_insert_cards(&self, records: &[CardKeyRecord]) -> Result<()> {
        let cf_cards = self.cf(cf::CARDS)?;
        let cf_by_issue = self.cf(cf::CARDS_BY_ISSUE)?;
        let cf_meta = self.cf(cf::META)?;

        let txn = self.db.transaction();

        // Locking the counter serializes concurrent batches.
        let mut seq = match txn
            .get_for_update_cf(&cf_meta, keys::NEXT_ISSUE_SEQ, true)
            .map_err(db_error)?
        {
            Some(bytes) => keys::decode_seq(&bytes)?,
            None => 0,
        };

        for record in records {
            let card_key = keys::card_key(record.key());

            // Reads inside the transaction see its own writes, so this also
            // catches a key repeated within the batch.
            if txn
                .get_for_update_cf(&cf_cards, &card_key, true)
                .map_err(db_error)?
                .is_some()
            {
                return Err(StoreError::DuplicateKey {
                    key: record.key().clone(),
                });
            }

            txn.put_cf(&cf_cards, &card_key, Self::serialize(record)?)
                .map_err(db_error)?;
            txn.put_cf(&cf_by_issue, keys::issue_key(seq), &card_key)
                .map_err(db_error)?;
            seq += 1;
        }

        txn.put_cf(&cf_meta, keys::NEXT_ISSUE_SEQ, keys::issue_key(seq))
            .map_err(db_error)?;
        txn.commit().map_err(db_error)
    }

    fn try_redeem_card(
        &self,
        key: &CardKey,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RedemptionRecord> {
        let cf_cards = self.cf(cf::CARDS)?;
        let cf_redemptions = self.cf(cf::REDEMPTIONS)?;
        let card_key = keys::card_key(key);

        let txn = self.db.transaction();

        // Exclusive lock on the record until commit or drop.
        let data = txn
            .get_for_update_cf(&cf_cards, &card_key, true)
            .map_err(db_error)?
            .ok_or(StoreError::Rejected(Rejection::NotFound))?;

        let mut record: CardKeyRecord = Self::deserialize(&data)?;
        record.redeem(token, now)?;

        let redemption = RedemptionRecord::for_record(&record).ok_or_else(|| {
            StoreError::Database(format!("record {key} still unused after redeem"))
        })?;

        txn.put_cf(&cf_cards, &card_key, Self::serialize(&record)?)
            .map_err(db_error)?;
        txn.put_cf(
            &cf_redemptions,
            keys::redemption_key(&redemption.id),
            Self::serialize(&redemption)?,
        )
        .map_err(db_error)?;
        txn.commit().map_err(db_error)?;

        Ok(redemption)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Card Operations
    // =========================================================================

    fn insert_cards(&self, records: &[CardKeyRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        with_conflict_retry("insert_cards", || self.try_insert_cards(records))
    }

    fn get_card(&self, key: &CardKey) -> Result<Option<CardKeyRecord>> {
        let cf = self.cf(cf::CARDS)?;

        self.db
            .get_cf(&cf, keys::card_key(key))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn card_count(&self) -> Result<usize> {
        let cf = self.cf(cf::META)?;

        let seq = self
            .db
            .get_cf(&cf, keys::NEXT_ISSUE_SEQ)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|bytes| keys::decode_seq(&bytes))
            .transpose()?
            .unwrap_or(0);

        usize::try_from(seq).map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list_cards(&self) -> Result<Vec<CardKeyRecord>> {
        let cf_by_issue = self.cf(cf::CARDS_BY_ISSUE)?;
        let cf_cards = self.cf(cf::CARDS)?;

        let mut records = Vec::new();
        for item in self.db.iterator_cf(&cf_by_issue, IteratorMode::Start) {
            let (_, card_key) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            let data = self
                .db
                .get_cf(&cf_cards, &card_key)
                .map_err(|e| StoreError::Database(e.to_string()))?;

            match data {
                Some(data) => records.push(Self::deserialize(&data)?),
                None => tracing::warn!(
                    card_key = %String::from_utf8_lossy(&card_key),
                    "Issuance index points at a missing record"
                ),
            }
        }

        Ok(records)
    }

    // =========================================================================
    // Redemption Operations
    // =========================================================================

    fn redeem_card(
        &self,
        key: &CardKey,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RedemptionRecord> {
        with_conflict_retry("redeem_card", || self.try_redeem_card(key, token, now))
    }

    fn list_redemptions(&self, limit: usize, offset: usize) -> Result<Vec<RedemptionRecord>> {
        let cf = self.cf(cf::REDEMPTIONS)?;

        // ULID keys: iterating from the end gives newest first.
        self.db
            .iterator_cf(&cf, IteratorMode::End)
            .skip(offset)
            .take(limit)
            .map(|item| {
                let (_, data) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                Self::deserialize(&data)
            })
            .collect()
    }
}

/// Map a `RocksDB` error, keeping lock conflicts distinguishable.
fn db_error(e: rocksdb::Error) -> StoreError {
    match e.kind() {
        ErrorKind::Busy | ErrorKind::TimedOut | ErrorKind::TryAgain => {
            StoreError::Conflict(e.to_string())
        }
        _ => StoreError::Database(e.to_string()),
    }
}

/// Run a transactional write, retrying when it loses a lock race.
fn with_conflict_retry<T>(op: &'static str, mut f: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 1;
    loop {
        match f() {
            Err(StoreError::Conflict(msg)) if attempt < MAX_CONFLICT_ATTEMPTS => {
                tracing::debug!(op, attempt, error = %msg, "Lock conflict, retrying");
                attempt += 1;
            }
            other => return other,
        }
    }
}
