//! HTTP request handlers.
//!
//! Handlers validate input, call into `services` with the storage handles
//! from [`AppState`](crate::state::AppState), and shape the response.

/// Administrative key listing
pub mod admin;
/// Payment-provider webhook placeholder
pub mod billing;
/// Credential extraction and caller resolution
pub mod credential;
/// Health check
pub mod health;
/// Key registration and usage statistics
pub mod keys;
/// Metered generation queries
pub mod query;
