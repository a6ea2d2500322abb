//! Usage ledger retention.
//!
//! Without a retention period the ledger keeps every counter forever and
//! `used_total` covers the full history. With one, a background task prunes
//! counters older than the period.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate};

use crate::{error::StorageError, services::quota::today, store::UsageLedger};

const PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// First date kept when retaining `retention_days` days up to `today`.
pub fn retention_cutoff(today: NaiveDate, retention_days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(retention_days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Delete counters outside the retention window ending today.
pub async fn prune_once(ledger: &dyn UsageLedger, retention_days: u32) -> Result<u64, StorageError> {
    let cutoff = retention_cutoff(today(), retention_days);
    let removed = ledger.prune_before(cutoff).await?;
    if removed > 0 {
        tracing::info!("Pruned {} usage counters dated before {}", removed, cutoff);
    }
    Ok(removed)
}

/// Spawn the hourly pruning task.
pub fn spawn(ledger: Arc<dyn UsageLedger>, retention_days: u32) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = prune_once(ledger.as_ref(), retention_days).await {
                tracing::error!("Usage retention pass failed: {}", e);
            }
        }
    })
}
