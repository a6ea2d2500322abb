//! Access key issuance.
//!
//! # Key format
//!
//! `tm_<plan>_<64 hex chars>`: the hex part is 32 bytes from the OS-seeded
//! CSPRNG (256 bits). Only the SHA-256 digest is stored.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::IssuanceError,
    models::access_key::{AccessKey, IssuedKey, Plan, hash_key},
    store::KeyStore,
};

/// Tag that starts every key, so leaked keys are recognizable.
pub const KEY_TAG: &str = "tm";

const MAX_CONTACT_LEN: usize = 254;

/// Generate a fresh plaintext key for `plan`.
pub fn generate_key(plan: Plan) -> String {
    let bytes: [u8; 32] = rand::random();
    format!("{KEY_TAG}_{plan}_{}", hex::encode(bytes))
}

/// Normalize and validate a registration email.
///
/// Trims and lowercases, then requires exactly one `@` with non-empty parts
/// on both sides.
pub fn normalize_owner(raw: &str) -> Result<String, IssuanceError> {
    let contact = raw.trim().to_lowercase();

    if contact.is_empty() {
        return Err(IssuanceError::InvalidOwner("email is required".to_string()));
    }
    if contact.len() > MAX_CONTACT_LEN {
        return Err(IssuanceError::InvalidOwner(format!(
            "email exceeds {MAX_CONTACT_LEN} characters"
        )));
    }
    match contact.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !contact.contains(char::is_whitespace) =>
        {
            Ok(contact)
        }
        _ => Err(IssuanceError::InvalidOwner(
            "email is not a valid address".to_string(),
        )),
    }
}

/// Issue a free-plan key to `owner_contact`.
///
/// Registration is one key per owner, ever: a second call for the same owner
/// fails with `DuplicateOwner` instead of returning the existing key.
///
/// # Errors
///
/// - `InvalidOwner`: the contact is not an email address
/// - `DuplicateOwner`: a key already exists for this contact
/// - `Storage`: the key store failed
pub async fn issue(keys: &dyn KeyStore, owner_contact: &str) -> Result<IssuedKey, IssuanceError> {
    let owner_contact = normalize_owner(owner_contact)?;
    let plan = Plan::Free;
    let key = generate_key(plan);

    let record = AccessKey {
        id: Uuid::new_v4(),
        key_hash: hash_key(&key),
        owner_contact,
        plan,
        created_at: Utc::now(),
        expires_at: None,
        is_active: true,
        external_billing_ref: None,
    };

    let record = keys
        .insert_key(&record)
        .await?
        .ok_or(IssuanceError::DuplicateOwner)?;

    tracing::info!("Issued {} key {}", record.plan, record.id);

    Ok(IssuedKey { key, record })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    #[test]
    fn generated_keys_are_tagged_and_carry_256_bits() {
        let key = generate_key(Plan::Free);
        let suffix = key.strip_prefix("tm_free_").unwrap();
        assert_eq!(suffix.len(), 64);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));

        assert!(generate_key(Plan::Pro).starts_with("tm_pro_"));
        assert_ne!(generate_key(Plan::Free), generate_key(Plan::Free));
    }

    #[test]
    fn normalizes_and_validates_contacts() {
        assert_eq!(
            normalize_owner("  Ana@Example.COM ").unwrap(),
            "ana@example.com"
        );
        for bad in ["", "   ", "no-at-sign", "@example.com", "ana@", "a@b@c", "a b@c.d"] {
            assert!(
                matches!(normalize_owner(bad), Err(IssuanceError::InvalidOwner(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn issues_active_free_key_without_expiry() {
        let store = InMemoryStore::new();
        let issued = issue(&store, "ana@example.com").await.unwrap();

        assert!(issued.key.starts_with("tm_free_"));
        assert_eq!(issued.record.key_hash, hash_key(&issued.key));
        assert_eq!(issued.record.owner_contact, "ana@example.com");
        assert_eq!(issued.record.plan, Plan::Free);
        assert!(issued.record.is_active);
        assert!(issued.record.expires_at.is_none());
    }

    #[tokio::test]
    async fn second_registration_for_owner_fails() {
        let store = InMemoryStore::new();
        issue(&store, "ana@example.com").await.unwrap();

        let again = issue(&store, "ANA@example.com ").await;
        assert!(matches!(again, Err(IssuanceError::DuplicateOwner)));
        assert_eq!(store.list_recent(100).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_issue_one_key() {
        let store = Arc::new(InMemoryStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { issue(&*store, "race@example.com").await })
            })
            .collect();

        let mut issued = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => issued += 1,
                Err(IssuanceError::DuplicateOwner) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(issued, 1);
        assert_eq!(store.list_recent(100).await.unwrap().len(), 1);
    }
}
