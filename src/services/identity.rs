//! Identity resolution.
//!
//! Maps the optional credential presented with a request to the ledger
//! identity it is counted against and the daily limit that applies.

use chrono::Utc;

use crate::{
    error::AuthError,
    models::{
        access_key::{AccessKey, Plan, PlanLimits, hash_key},
        identity::{Caller, Identity},
    },
    store::KeyStore,
};

/// Resolve a credential to a caller.
///
/// - No credential (or a blank one): the shared anonymous identity on the
///   free plan.
/// - A credential: must name an active, unexpired key, otherwise
///   `InvalidCredential`. The caller gets the key's identity and its plan's
///   limit.
///
/// Read-only.
pub async fn resolve(
    keys: &dyn KeyStore,
    limits: PlanLimits,
    credential: Option<&str>,
) -> Result<Caller, AuthError> {
    let Some(credential) = credential.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(Caller {
            identity: Identity::Anonymous,
            plan: Plan::Free,
            limit: limits.free,
        });
    };

    let key = find_usable_key(keys, credential).await?;

    Ok(Caller {
        identity: Identity::Key(key.key_hash),
        plan: key.plan,
        limit: limits.limit_for(key.plan),
    })
}

/// Look up the key a credential names, if it is active and unexpired.
///
/// Every path that authenticates with a key goes through here.
pub async fn find_usable_key(
    keys: &dyn KeyStore,
    credential: &str,
) -> Result<AccessKey, AuthError> {
    keys.find_active(&hash_key(credential))
        .await?
        .filter(|key| key.is_usable_at(Utc::now()))
        .ok_or(AuthError::InvalidCredential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::key_issuer;
    use crate::store::InMemoryStore;
    use chrono::Duration;

    #[tokio::test]
    async fn absent_credential_is_anonymous_on_free_limit() {
        let store = InMemoryStore::new();
        let limits = PlanLimits::default();

        for credential in [None, Some(""), Some("   ")] {
            let caller = resolve(&store, limits, credential).await.unwrap();
            assert_eq!(caller.identity, Identity::Anonymous);
            assert_eq!(caller.plan, Plan::Free);
            assert_eq!(caller.limit, 10);
        }
    }

    #[tokio::test]
    async fn unknown_key_is_rejected() {
        let store = InMemoryStore::new();
        let result = resolve(&store, PlanLimits::default(), Some("nonexistent-key")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredential)));
    }

    #[tokio::test]
    async fn issued_key_resolves_to_its_own_identity() {
        let store = InMemoryStore::new();
        let issued = key_issuer::issue(&store, "dev@example.com").await.unwrap();

        let caller = resolve(&store, PlanLimits::default(), Some(&issued.key))
            .await
            .unwrap();
        assert_eq!(caller.identity, Identity::for_key(&issued.key));
        assert_eq!(caller.plan, Plan::Free);
        assert_eq!(caller.limit, 10);
    }

    #[tokio::test]
    async fn pro_key_gets_pro_limit() {
        let store = InMemoryStore::new();
        let issued = key_issuer::issue(&store, "pro@example.com").await.unwrap();
        store.set_plan(&issued.record.key_hash, Plan::Pro).unwrap();

        let caller = resolve(&store, PlanLimits::default(), Some(&issued.key))
            .await
            .unwrap();
        assert_eq!(caller.plan, Plan::Pro);
        assert_eq!(caller.limit, 999_999);
    }

    #[tokio::test]
    async fn expired_key_is_rejected() {
        let store = InMemoryStore::new();
        let issued = key_issuer::issue(&store, "old@example.com").await.unwrap();
        store
            .set_expires_at(&issued.record.key_hash, Some(Utc::now() - Duration::days(1)))
            .unwrap();

        let result = resolve(&store, PlanLimits::default(), Some(&issued.key)).await;
        assert!(matches!(result, Err(AuthError::InvalidCredential)));
    }

    #[tokio::test]
    async fn deactivated_key_is_rejected() {
        let store = InMemoryStore::new();
        let issued = key_issuer::issue(&store, "gone@example.com").await.unwrap();
        store.set_active(&issued.record.key_hash, false).unwrap();

        let result = resolve(&store, PlanLimits::default(), Some(&issued.key)).await;
        assert!(matches!(result, Err(AuthError::InvalidCredential)));
    }
}
