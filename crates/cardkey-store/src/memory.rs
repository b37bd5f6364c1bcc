//! In-memory storage implementation.
//!
//! Used by tests and by builds without the `RocksDB` backend. Nothing survives
//! a restart.
//!
//! Each record has its own redemption mutex, which serializes redeemers of
//! that key. Readers never take it: they clone the current snapshot, which a
//! redeemer replaces only after its checks pass. The table lock is only taken
//! for writing by batch inserts, so redemptions of different keys never wait
//! on each other.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use cardkey_core::{CardKey, CardKeyRecord, RedemptionRecord, Rejection};

use crate::error::{Result, StoreError};
use crate::Store;

struct Slot {
    redeem: Mutex<()>,
    current: RwLock<CardKeyRecord>,
}

impl Slot {
    fn new(record: CardKeyRecord) -> Self {
        Self {
            redeem: Mutex::new(()),
            current: RwLock::new(record),
        }
    }

    fn snapshot(&self) -> Result<CardKeyRecord> {
        Ok(self.current.read().map_err(poisoned)?.clone())
    }
}

#[derive(Default)]
struct CardTable {
    order: Vec<Arc<Slot>>,
    index: HashMap<CardKey, Arc<Slot>>,
}

/// In-memory storage implementation.
#[derive(Default)]
pub struct MemoryStore {
    cards: RwLock<CardTable>,
    redemptions: Mutex<Vec<RedemptionRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &CardKey) -> Result<Option<Arc<Slot>>> {
        let table = self.cards.read().map_err(poisoned)?;
        Ok(table.index.get(key).cloned())
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Database("lock poisoned".into())
}

impl Store for MemoryStore {
    fn insert_cards(&self, records: &[CardKeyRecord]) -> Result<()> {
        let mut table = self.cards.write().map_err(poisoned)?;

        let mut batch = HashSet::with_capacity(records.len());
        for record in records {
            if table.index.contains_key(record.key()) || !batch.insert(record.key()) {
                return Err(StoreError::DuplicateKey {
                    key: record.key().clone(),
                });
            }
        }

        for record in records {
            let slot = Arc::new(Slot::new(record.clone()));
            table.index.insert(record.key().clone(), Arc::clone(&slot));
            table.order.push(slot);
        }

        Ok(())
    }

    fn get_card(&self, key: &CardKey) -> Result<Option<CardKeyRecord>> {
        match self.slot(key)? {
            Some(slot) => Ok(Some(slot.snapshot()?)),
            None => Ok(None),
        }
    }

    fn contains_card(&self, key: &CardKey) -> Result<bool> {
        Ok(self.slot(key)?.is_some())
    }

    fn card_count(&self) -> Result<usize> {
        Ok(self.cards.read().map_err(poisoned)?.order.len())
    }

    fn list_cards(&self) -> Result<Vec<CardKeyRecord>> {
        let slots = self.cards.read().map_err(poisoned)?.order.clone();

        slots
            .iter()
            .map(|slot| slot.snapshot())
            .collect()
    }

    fn redeem_card(
        &self,
        key: &CardKey,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RedemptionRecord> {
        let slot = self
            .slot(key)?
            .ok_or(StoreError::Rejected(Rejection::NotFound))?;

        let _redeeming = slot.redeem.lock().map_err(poisoned)?;

        let mut updated = slot.snapshot()?;
        updated.redeem(token, now)?;
        let redemption = RedemptionRecord::for_record(&updated).ok_or_else(|| {
            StoreError::Database(format!("record {key} still unused after redeem"))
        })?;

        self.redemptions
            .lock()
            .map_err(poisoned)?
            .push(redemption.clone());
        *slot.current.write().map_err(poisoned)? = updated;

        Ok(redemption)
    }

    fn list_redemptions(&self, limit: usize, offset: usize) -> Result<Vec<RedemptionRecord>> {
        let log = self.redemptions.lock().map_err(poisoned)?;
        Ok(log.iter().rev().skip(offset).take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(key: &str) -> CardKeyRecord {
        CardKeyRecord::issue(CardKey::parse(key).unwrap(), Utc::now(), None)
    }

    #[test]
    fn insert_get_list() {
        let store = MemoryStore::new();
        store
            .insert_cards(&[record("VIP-ZZ"), record("VIP-AA")])
            .unwrap();

        assert_eq!(store.card_count().unwrap(), 2);
        assert!(store.contains_card(&CardKey::parse("VIP-AA").unwrap()).unwrap());

        let keys: Vec<_> = store
            .list_cards()
            .unwrap()
            .into_iter()
            .map(|r| r.key().to_string())
            .collect();
        assert_eq!(keys, vec!["VIP-ZZ", "VIP-AA"]);
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.insert_cards(&[record("VIP-AA")]).unwrap();

        let result = store.insert_cards(&[record("VIP-BB"), record("VIP-AA")]);
        assert!(matches!(result, Err(StoreError::DuplicateKey { .. })));
        assert_eq!(store.card_count().unwrap(), 1);

        let result = store.insert_cards(&[record("VIP-CC"), record("VIP-CC")]);
        assert!(matches!(result, Err(StoreError::DuplicateKey { .. })));
        assert_eq!(store.card_count().unwrap(), 1);
    }

    #[test]
    fn redeem_rejections_leave_record_untouched() {
        let store = MemoryStore::new();
        let issued = Utc::now() - Duration::days(2);
        let expired = CardKeyRecord::issue(
            CardKey::parse("VIP-OLD").unwrap(),
            issued,
            Some(issued + Duration::days(1)),
        );
        store.insert_cards(&[expired.clone()]).unwrap();

        let result = store.redeem_card(expired.key(), "tok", Utc::now());
        assert!(matches!(
            result,
            Err(StoreError::Rejected(Rejection::Expired))
        ));
        assert_eq!(store.get_card(expired.key()).unwrap().unwrap(), expired);

        let missing = store.redeem_card(&CardKey::parse("VIP-NONE").unwrap(), "t", Utc::now());
        assert!(matches!(
            missing,
            Err(StoreError::Rejected(Rejection::NotFound))
        ));
        assert!(store.list_redemptions(10, 0).unwrap().is_empty());
    }

    #[test]
    fn concurrent_redeem_has_one_winner() {
        let store = MemoryStore::new();
        let card = record("VIP-RACE");
        store.insert_cards(&[card.clone()]).unwrap();

        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..32)
                .map(|i| {
                    let store = &store;
                    let key = card.key();
                    s.spawn(move || store.redeem_card(key, &format!("t{i}"), Utc::now()))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(StoreError::Rejected(Rejection::AlreadyUsed))))
                .count(),
            31
        );

        let stored = store.get_card(card.key()).unwrap().unwrap();
        assert_eq!(stored.bound_token(), Some(winners[0].token.as_str()));
        assert_eq!(store.list_redemptions(100, 0).unwrap().len(), 1);
    }

    #[test]
    fn reads_do_not_wait_on_a_redemption_in_progress() {
        let store = MemoryStore::new();
        let card = record("VIP-BUSY");
        store.insert_cards(&[card.clone()]).unwrap();

        let slot = store.slot(card.key()).unwrap().unwrap();
        let _redeeming = slot.redeem.lock().unwrap();

        assert_eq!(store.get_card(card.key()).unwrap(), Some(card.clone()));
        assert_eq!(store.list_cards().unwrap(), vec![card]);
    }

    #[test]
    fn redemptions_newest_first() {
        let store = MemoryStore::new();
        store
            .insert_cards(&[record("VIP-1"), record("VIP-2")])
            .unwrap();
        store
            .redeem_card(&CardKey::parse("VIP-1").unwrap(), "a", Utc::now())
            .unwrap();
        store
            .redeem_card(&CardKey::parse("VIP-2").unwrap(), "b", Utc::now())
            .unwrap();

        let log = store.list_redemptions(10, 0).unwrap();
        assert_eq!(log[0].card_key.as_str(), "VIP-2");
        assert_eq!(log[1].card_key.as_str(), "VIP-1");
        assert_eq!(store.list_redemptions(10, 1).unwrap().len(), 1);
    }
}
