//! In-process storage.
//!
//! Nothing survives a restart. Each table sits behind its own lock and every
//! read-check-write happens under a single guard, which gives the same
//! atomicity as the PostgreSQL statements within one process.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::{KeyStore, UsageLedger};
use crate::{
    error::StorageError,
    models::access_key::{AccessKey, Plan},
};

#[derive(Default)]
struct KeyTable {
    by_hash: HashMap<String, AccessKey>,
    /// Key hashes in insertion order.
    order: Vec<String>,
}

/// Key store and usage ledger held in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    keys: RwLock<KeyTable>,
    counters: Mutex<HashMap<(String, NaiveDate), i64>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self) -> Result<MutexGuard<'_, HashMap<(String, NaiveDate), i64>>, StorageError> {
        self.counters
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    /// Change the plan of a stored key. Stands in for the billing process
    /// that owns plan changes.
    pub fn set_plan(&self, key_hash: &str, plan: Plan) -> Result<(), StorageError> {
        self.update_key(key_hash, |key| key.plan = plan)
    }

    /// Activate or deactivate a stored key.
    pub fn set_active(&self, key_hash: &str, active: bool) -> Result<(), StorageError> {
        self.update_key(key_hash, |key| key.is_active = active)
    }

    /// Set or clear a stored key's expiry.
    pub fn set_expires_at(
        &self,
        key_hash: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError> {
        self.update_key(key_hash, |key| key.expires_at = expires_at)
    }

    fn update_key(&self, key_hash: &str, f: impl FnOnce(&mut AccessKey)) -> Result<(), StorageError> {
        let mut table = self
            .keys
            .write()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let key = table
            .by_hash
            .get_mut(key_hash)
            .ok_or_else(|| StorageError::Corrupt(format!("no key with hash {key_hash}")))?;
        f(key);
        Ok(())
    }
}

#[async_trait]
impl KeyStore for InMemoryStore {
    async fn insert_key(&self, key: &AccessKey) -> Result<Option<AccessKey>, StorageError> {
        let mut table = self
            .keys
            .write()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        if table
            .by_hash
            .values()
            .any(|existing| existing.owner_contact == key.owner_contact)
        {
            return Ok(None);
        }
        if table.by_hash.contains_key(&key.key_hash) {
            return Err(StorageError::Corrupt("duplicate key hash".to_string()));
        }

        table.by_hash.insert(key.key_hash.clone(), key.clone());
        table.order.push(key.key_hash.clone());
        Ok(Some(key.clone()))
    }

    async fn find_active(&self, key_hash: &str) -> Result<Option<AccessKey>, StorageError> {
        let table = self
            .keys
            .read()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        Ok(table
            .by_hash
            .get(key_hash)
            .filter(|key| key.is_active)
            .cloned())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<AccessKey>, StorageError> {
        let table = self
            .keys
            .read()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let limit = usize::try_from(limit).unwrap_or(0);

        Ok(table
            .order
            .iter()
            .rev()
            .filter_map(|hash| table.by_hash.get(hash))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.counters().map(|_| ())
    }
}

#[async_trait]
impl UsageLedger for InMemoryStore {
    async fn try_increment(
        &self,
        identity: &str,
        date: NaiveDate,
        limit: i64,
    ) -> Result<Option<i64>, StorageError> {
        let mut counters = self.counters()?;
        let key = (identity.to_string(), date);
        let current = counters.get(&key).copied().unwrap_or(0);

        if current >= limit {
            return Ok(None);
        }
        counters.insert(key, current + 1);
        Ok(Some(current + 1))
    }

    async fn count_on(&self, identity: &str, date: NaiveDate) -> Result<i64, StorageError> {
        let counters = self.counters()?;
        Ok(counters
            .get(&(identity.to_string(), date))
            .copied()
            .unwrap_or(0))
    }

    async fn total_for(&self, identity: &str) -> Result<i64, StorageError> {
        let counters = self.counters()?;
        Ok(counters
            .iter()
            .filter(|((id, _), _)| id == identity)
            .map(|(_, count)| *count)
            .sum())
    }

    async fn prune_before(&self, cutoff: NaiveDate) -> Result<u64, StorageError> {
        let mut counters = self.counters()?;
        let before = counters.len();
        counters.retain(|(_, date), _| *date >= cutoff);
        Ok((before - counters.len()) as u64)
    }
}
