//! Storage handles for the key store and the usage ledger.
//!
//! Components never reach storage through globals: a handle implementing
//! these traits is opened at startup and passed to every operation.
//!
//! - [`PgStore`]: PostgreSQL, durable, safe across connections.
//! - [`InMemoryStore`]: process memory only; used when no database is
//!   configured and in tests.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{error::StorageError, models::access_key::AccessKey};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Persisted table of issued access keys.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Insert `key` unless its owner already holds a key (active or not).
    ///
    /// The uniqueness check and the insert are a single step: of any number
    /// of concurrent inserts for one owner, exactly one returns `Some`.
    /// Returns `None` when the owner is taken.
    async fn insert_key(&self, key: &AccessKey) -> Result<Option<AccessKey>, StorageError>;

    /// Look up an active key by the digest of its plaintext.
    async fn find_active(&self, key_hash: &str) -> Result<Option<AccessKey>, StorageError>;

    /// The `limit` most recently created keys, newest first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<AccessKey>, StorageError>;

    /// Verify the store is reachable.
    async fn ping(&self) -> Result<(), StorageError>;
}

/// Persisted per-identity, per-day request counters.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Atomically admit one request for `(identity, date)` if its count is
    /// below `limit`.
    ///
    /// Inserts the counter with a count of one or increments it, as one
    /// indivisible operation relative to other callers on the same key.
    /// Returns the count after the increment, or `None` (and changes
    /// nothing) when the count had already reached `limit`.
    ///
    /// `limit` must be positive.
    async fn try_increment(
        &self,
        identity: &str,
        date: NaiveDate,
        limit: i64,
    ) -> Result<Option<i64>, StorageError>;

    /// Count recorded for `(identity, date)`, zero if none.
    async fn count_on(&self, identity: &str, date: NaiveDate) -> Result<i64, StorageError>;

    /// Sum of all counts ever recorded for `identity`.
    async fn total_for(&self, identity: &str) -> Result<i64, StorageError>;

    /// Delete counters dated strictly before `cutoff`. Returns rows removed.
    async fn prune_before(&self, cutoff: NaiveDate) -> Result<u64, StorageError>;
}
