//! Daily quota enforcement.
//!
//! # Atomicity
//!
//! The check against the limit and the increment are one storage operation
//! ([`UsageLedger::try_increment`]). Two concurrent requests for the last
//! remaining slot can never both be admitted.

use chrono::{Local, NaiveDate};

use crate::{
    error::StorageError,
    models::{identity::Identity, usage::QuotaDecision},
    store::UsageLedger,
};

/// Today's ledger date: the wall-clock date in the process-local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Admit one request for `identity` against today's counter.
///
/// Returns `allowed = false, remaining = 0` without touching the ledger
/// once `limit` requests have been admitted today. Otherwise records the
/// request and returns how many remain after it.
///
/// # Errors
///
/// Storage failures propagate unchanged. Nothing is retried.
pub async fn check_and_consume(
    ledger: &dyn UsageLedger,
    identity: &Identity,
    limit: i64,
) -> Result<QuotaDecision, StorageError> {
    check_and_consume_on(ledger, identity, limit, today()).await
}

/// [`check_and_consume`] against the counter of an explicit date.
pub async fn check_and_consume_on(
    ledger: &dyn UsageLedger,
    identity: &Identity,
    limit: i64,
    date: NaiveDate,
) -> Result<QuotaDecision, StorageError> {
    if limit <= 0 {
        return Ok(QuotaDecision::denied());
    }

    match ledger.try_increment(identity.as_str(), date, limit).await? {
        Some(count) => Ok(QuotaDecision {
            allowed: true,
            remaining: limit - count,
        }),
        None => {
            tracing::info!("Daily quota of {} reached for {}", limit, identity);
            Ok(QuotaDecision::denied())
        }
    }
}
