//! Data models for stored entities and API request/response types.

/// Access keys and plans
pub mod access_key;
/// Ledger identities
pub mod identity;
/// Generation query request/response types
pub mod query;
/// Usage counters, quota decisions and summaries
pub mod usage;
