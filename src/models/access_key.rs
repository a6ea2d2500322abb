//! Access key model.
//!
//! Access keys authenticate callers and select their plan. Only the SHA-256
//! digest of a key is persisted; the plaintext is handed to the owner once,
//! at issuance.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::StorageError;

/// Subscription tier of an access key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

impl Plan {
    pub const DEFAULT_FREE_DAILY_LIMIT: i64 = 10;

    /// Pro is "unlimited": a limit large enough to never be reached in a day.
    pub const DEFAULT_PRO_DAILY_LIMIT: i64 = 999_999;

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            other => Err(StorageError::Corrupt(format!("unknown plan '{other}'"))),
        }
    }
}

/// Daily request limits per plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    pub free: i64,
    pub pro: i64,
}

impl PlanLimits {
    pub fn limit_for(&self, plan: Plan) -> i64 {
        match plan {
            Plan::Free => self.free,
            Plan::Pro => self.pro,
        }
    }
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            free: Plan::DEFAULT_FREE_DAILY_LIMIT,
            pro: Plan::DEFAULT_PRO_DAILY_LIMIT,
        }
    }
}

/// An issued access key as held by the key store.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessKey {
    pub id: Uuid,

    /// SHA-256 digest of the plaintext key (64 hex characters).
    ///
    /// Also the ledger identity under which the key's usage is counted.
    pub key_hash: String,

    /// Registration email, normalized. Unique across all keys ever issued.
    pub owner_contact: String,

    pub plan: Plan,

    pub created_at: DateTime<Utc>,

    /// `None` means the key never expires.
    pub expires_at: Option<DateTime<Utc>>,

    /// Inactive keys are rejected exactly like unknown ones.
    pub is_active: bool,

    /// Payment-provider customer or subscription id. Not read by quota logic.
    pub external_billing_ref: Option<String>,
}

impl AccessKey {
    /// Whether the key can authenticate a request at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// Raw `access_keys` row. `plan` is stored as text and parsed on read.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccessKeyRow {
    pub id: Uuid,
    pub key_hash: String,
    pub owner_contact: String,
    pub plan: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub external_billing_ref: Option<String>,
}

impl TryFrom<AccessKeyRow> for AccessKey {
    type Error = StorageError;

    fn try_from(row: AccessKeyRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            key_hash: row.key_hash,
            owner_contact: row.owner_contact,
            plan: row.plan.parse()?,
            created_at: row.created_at,
            expires_at: row.expires_at,
            is_active: row.is_active,
            external_billing_ref: row.external_billing_ref,
        })
    }
}

/// The result of a successful issuance: the stored record plus the plaintext
/// key, which is not recoverable afterwards.
#[derive(Debug, Clone)]
pub struct IssuedKey {
    pub key: String,
    pub record: AccessKey,
}

/// Hash a plaintext key for storage and lookup.
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Request body for `POST /api/signup`.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
}

/// Response body for `POST /api/signup`.
///
/// ```json
/// {
///   "api_key": "tm_free_3f9a...",
///   "plan": "free",
///   "expires_at": null
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub api_key: String,
    pub plan: Plan,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<IssuedKey> for SignupResponse {
    fn from(issued: IssuedKey) -> Self {
        Self {
            api_key: issued.key,
            plan: issued.record.plan,
            expires_at: issued.record.expires_at,
        }
    }
}

/// A key as shown in the admin listing. Never includes the key itself.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminKeyView {
    pub owner_contact: String,
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl From<AccessKey> for AdminKeyView {
    fn from(key: AccessKey) -> Self {
        Self {
            owner_contact: key.owner_contact,
            plan: key.plan,
            created_at: key.created_at,
            expires_at: key.expires_at,
            is_active: key.is_active,
        }
    }
}

/// Response body for `GET /admin/keys`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminKeyList {
    pub keys: Vec<AdminKeyView>,
    pub total: usize,
}
