//! Usage ledger models.

use serde::{Deserialize, Serialize};

use super::access_key::Plan;

/// Outcome of a quota check.
///
/// A denial is an ordinary decision, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub remaining: i64,
}

impl QuotaDecision {
    pub fn denied() -> Self {
        Self {
            allowed: false,
            remaining: 0,
        }
    }
}

/// Usage statistics for one key, returned by `GET /api/stats`.
///
/// ```json
/// {
///   "owner": "ana@example.com",
///   "plan": "free",
///   "used_today": 4,
///   "used_total": 27,
///   "limit": 10,
///   "remaining": 6
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub owner: String,
    pub plan: Plan,
    pub used_today: i64,
    pub used_total: i64,
    pub limit: i64,
    /// Never negative, even if `used_today` exceeds a since-lowered limit.
    pub remaining: i64,
}
