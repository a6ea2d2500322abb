//! Usage statistics and the administrative key listing.

use crate::{
    error::{AdminError, AuthError},
    models::{
        access_key::{AccessKey, PlanLimits},
        usage::UsageSummary,
    },
    services::{identity::find_usable_key, quota::today},
    store::{KeyStore, UsageLedger},
};

/// Largest page the admin listing returns.
pub const MAX_ADMIN_PAGE: i64 = 100;

/// Summarize today's and all-time usage for an active key.
///
/// Read-only: calling it never changes any counter.
///
/// # Errors
///
/// - `InvalidCredential`: the key is unknown, inactive or expired
/// - `Storage`: the key store or ledger failed
pub async fn get_usage_summary(
    keys: &dyn KeyStore,
    ledger: &dyn UsageLedger,
    limits: PlanLimits,
    key: &str,
) -> Result<UsageSummary, AuthError> {
    let record = find_usable_key(keys, key).await?;

    let used_today = ledger.count_on(&record.key_hash, today()).await?;
    let used_total = ledger.total_for(&record.key_hash).await?;
    let limit = limits.limit_for(record.plan);

    Ok(UsageSummary {
        owner: record.owner_contact,
        plan: record.plan,
        used_today,
        used_total,
        limit,
        remaining: (limit - used_today).max(0),
    })
}

/// List the most recently created keys.
///
/// Gated by plain equality against the configured shared secret. With no
/// secret configured the listing is refused. `page_size` is clamped to
/// `1..=MAX_ADMIN_PAGE`.
pub async fn list_recent_keys(
    keys: &dyn KeyStore,
    admin_secret: Option<&str>,
    presented: Option<&str>,
    page_size: i64,
) -> Result<Vec<AccessKey>, AdminError> {
    match (admin_secret, presented) {
        (Some(secret), Some(presented)) if secret == presented => {}
        _ => {
            tracing::warn!("Rejected admin listing request");
            return Err(AdminError::Forbidden);
        }
    }

    Ok(keys.list_recent(page_size.clamp(1, MAX_ADMIN_PAGE)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{access_key::Plan, identity::Identity};
    use crate::services::{key_issuer, quota};
    use crate::store::InMemoryStore;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn pro_key_summary_reports_remaining() {
        let store = InMemoryStore::new();
        let issued = key_issuer::issue(&store, "pro@example.com").await.unwrap();
        store.set_plan(&issued.record.key_hash, Plan::Pro).unwrap();

        let identity = Identity::for_key(&issued.key);
        for _ in 0..5 {
            quota::check_and_consume(&store, &identity, 999_999).await.unwrap();
        }

        let summary = get_usage_summary(&store, &store, PlanLimits::default(), &issued.key)
            .await
            .unwrap();
        assert_eq!(summary.owner, "pro@example.com");
        assert_eq!(summary.plan, Plan::Pro);
        assert_eq!(summary.used_today, 5);
        assert_eq!(summary.limit, 999_999);
        assert_eq!(summary.remaining, 999_994);
    }

    #[tokio::test]
    async fn totals_include_earlier_days() {
        let store = InMemoryStore::new();
        let issued = key_issuer::issue(&store, "ana@example.com").await.unwrap();
        let identity = Identity::for_key(&issued.key);
        let yesterday = quota::today() - Duration::days(1);

        for _ in 0..3 {
            quota::check_and_consume_on(&store, &identity, 10, yesterday)
                .await
                .unwrap();
        }
        quota::check_and_consume(&store, &identity, 10).await.unwrap();

        let summary = get_usage_summary(&store, &store, PlanLimits::default(), &issued.key)
            .await
            .unwrap();
        assert_eq!(summary.used_today, 1);
        assert_eq!(summary.used_total, 4);
        assert_eq!(summary.remaining, 9);
    }

    #[tokio::test]
    async fn remaining_is_never_negative() {
        let store = InMemoryStore::new();
        let issued = key_issuer::issue(&store, "ana@example.com").await.unwrap();
        let identity = Identity::for_key(&issued.key);

        // Usage recorded under a higher limit than the one now in force.
        for _ in 0..12 {
            quota::check_and_consume(&store, &identity, 20).await.unwrap();
        }

        let summary = get_usage_summary(&store, &store, PlanLimits::default(), &issued.key)
            .await
            .unwrap();
        assert_eq!(summary.used_today, 12);
        assert_eq!(summary.remaining, 0);
    }

    #[tokio::test]
    async fn summary_is_read_only() {
        let store = InMemoryStore::new();
        let issued = key_issuer::issue(&store, "ana@example.com").await.unwrap();
        quota::check_and_consume(&store, &Identity::for_key(&issued.key), 10)
            .await
            .unwrap();

        for _ in 0..5 {
            let summary = get_usage_summary(&store, &store, PlanLimits::default(), &issued.key)
                .await
                .unwrap();
            assert_eq!(summary.used_today, 1);
        }
    }

    #[tokio::test]
    async fn unknown_or_inactive_key_is_rejected() {
        let store = InMemoryStore::new();
        let missing = get_usage_summary(&store, &store, PlanLimits::default(), "tm_free_nope").await;
        assert!(matches!(missing, Err(AuthError::InvalidCredential)));

        let issued = key_issuer::issue(&store, "ana@example.com").await.unwrap();
        store.set_active(&issued.record.key_hash, false).unwrap();
        let inactive = get_usage_summary(&store, &store, PlanLimits::default(), &issued.key).await;
        assert!(matches!(inactive, Err(AuthError::InvalidCredential)));
    }

    #[tokio::test]
    async fn expired_key_has_no_summary() {
        let store = InMemoryStore::new();
        let issued = key_issuer::issue(&store, "ana@example.com").await.unwrap();
        quota::check_and_consume(&store, &Identity::for_key(&issued.key), 10)
            .await
            .unwrap();
        store
            .set_expires_at(&issued.record.key_hash, Some(Utc::now() - Duration::days(1)))
            .unwrap();

        let result = get_usage_summary(&store, &store, PlanLimits::default(), &issued.key).await;
        assert!(matches!(result, Err(AuthError::InvalidCredential)));
    }

    #[tokio::test]
    async fn admin_listing_requires_matching_secret() {
        let store = InMemoryStore::new();
        for i in 0..3 {
            key_issuer::issue(&store, &format!("user{i}@example.com"))
                .await
                .unwrap();
        }

        for (secret, presented) in [
            (None, Some("anything")),
            (Some("s3cret"), None),
            (Some("s3cret"), Some("wrong")),
        ] {
            let result = list_recent_keys(&store, secret, presented, 10).await;
            assert!(matches!(result, Err(AdminError::Forbidden)));
        }

        let keys = list_recent_keys(&store, Some("s3cret"), Some("s3cret"), 2)
            .await
            .unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].owner_contact, "user2@example.com");

        let clamped = list_recent_keys(&store, Some("s3cret"), Some("s3cret"), 0)
            .await
            .unwrap();
        assert_eq!(clamped.len(), 1);
    }
}
