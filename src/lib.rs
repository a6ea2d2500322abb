//! Quota gateway: metered access to a text-generation engine.
//!
//! Callers are identified by an optional access key, counted against a
//! per-identity daily quota in a persisted ledger, and admitted or rejected
//! before the request reaches the generation engine.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum
//! - **Storage**: PostgreSQL via sqlx, or in process memory
//! - **Authentication**: optional API key, stored as a SHA-256 digest
//! - **Quota**: one atomic conditional upsert per admitted request

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use routes::build_router;
pub use state::AppState;
