//! Ledger identities.
//!
//! An identity is the bucket a request is counted against: either a specific
//! access key or the single bucket shared by all anonymous traffic.

use std::fmt;

use super::access_key::{Plan, hash_key};

/// Ledger identity of anonymous callers. Key identities are 64 hex
/// characters, so they can never collide with it.
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Every unauthenticated caller, everywhere.
    Anonymous,
    /// A key, identified by the digest of its plaintext.
    Key(String),
}

impl Identity {
    /// Identity of the key whose plaintext is `key`.
    pub fn for_key(key: &str) -> Self {
        Identity::Key(hash_key(key))
    }

    /// The string under which this identity's counters are stored.
    pub fn as_str(&self) -> &str {
        match self {
            Identity::Anonymous => ANONYMOUS_IDENTITY,
            Identity::Key(hash) => hash,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Anonymous => f.write_str(ANONYMOUS_IDENTITY),
            // Only a short prefix of the digest is ever logged.
            Identity::Key(hash) => write!(f, "key:{}", &hash[..hash.len().min(12)]),
        }
    }
}

/// A resolved caller: who to count against and how much they may use today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub identity: Identity,
    pub plan: Plan,
    pub limit: i64,
}
