//! PostgreSQL storage.
//!
//! The quota check is one `INSERT .. ON CONFLICT .. DO UPDATE .. WHERE`
//! statement. PostgreSQL locks the conflicting row and re-evaluates the
//! `WHERE` against its latest version, so concurrent admissions on the same
//! `(identity, usage_date)` serialize without any explicit transaction.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{KeyStore, UsageLedger};
use crate::{
    db::DbPool,
    error::StorageError,
    models::access_key::{AccessKey, AccessKeyRow},
};

/// Key store and usage ledger backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Close every pooled connection. Called once the server has stopped.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl KeyStore for PgStore {
    async fn insert_key(&self, key: &AccessKey) -> Result<Option<AccessKey>, StorageError> {
        // ON CONFLICT covers the owner constraint only; a key_hash collision
        // surfaces as a database error.
        let row = sqlx::query_as::<_, AccessKeyRow>(
            r#"
            INSERT INTO access_keys (
                id,
                key_hash,
                owner_contact,
                plan,
                created_at,
                expires_at,
                is_active,
                external_billing_ref
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (owner_contact) DO NOTHING
            RETURNING id, key_hash, owner_contact, plan, created_at, expires_at,
                      is_active, external_billing_ref
            "#,
        )
        .bind(key.id)
        .bind(&key.key_hash)
        .bind(&key.owner_contact)
        .bind(key.plan.as_str())
        .bind(key.created_at)
        .bind(key.expires_at)
        .bind(key.is_active)
        .bind(&key.external_billing_ref)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccessKey::try_from).transpose()
    }

    async fn find_active(&self, key_hash: &str) -> Result<Option<AccessKey>, StorageError> {
        let row = sqlx::query_as::<_, AccessKeyRow>(
            "SELECT id, key_hash, owner_contact, plan, created_at, expires_at,
                    is_active, external_billing_ref
             FROM access_keys
             WHERE key_hash = $1 AND is_active = true",
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccessKey::try_from).transpose()
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<AccessKey>, StorageError> {
        let rows = sqlx::query_as::<_, AccessKeyRow>(
            "SELECT id, key_hash, owner_contact, plan, created_at, expires_at,
                    is_active, external_billing_ref
             FROM access_keys
             ORDER BY created_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AccessKey::try_from).collect()
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UsageLedger for PgStore {
    async fn try_increment(
        &self,
        identity: &str,
        date: NaiveDate,
        limit: i64,
    ) -> Result<Option<i64>, StorageError> {
        // No row comes back when the WHERE guard rejects the update.
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO usage_counters (identity, usage_date, count)
            VALUES ($1, $2, 1)
            ON CONFLICT (identity, usage_date)
            DO UPDATE SET count = usage_counters.count + 1
            WHERE usage_counters.count < $3
            RETURNING count
            "#,
        )
        .bind(identity)
        .bind(date)
        .bind(limit)
        .fetch_optional(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_on(&self, identity: &str, date: NaiveDate) -> Result<i64, StorageError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT count FROM usage_counters WHERE identity = $1 AND usage_date = $2",
        )
        .bind(identity)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(count.unwrap_or(0))
    }

    async fn total_for(&self, identity: &str) -> Result<i64, StorageError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(count), 0)::BIGINT FROM usage_counters WHERE identity = $1",
        )
        .bind(identity)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn prune_before(&self, cutoff: NaiveDate) -> Result<u64, StorageError> {
        let removed = sqlx::query("DELETE FROM usage_counters WHERE usage_date < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(removed)
    }
}
