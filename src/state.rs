//! Shared application state.

use std::sync::Arc;

use crate::{
    models::access_key::PlanLimits,
    services::generation::GenerationEngine,
    store::{KeyStore, UsageLedger},
};

/// Handles shared by every request.
///
/// The storage handles are opened once at startup and injected here; no
/// component reaches storage any other way.
#[derive(Clone)]
pub struct AppState {
    pub keys: Arc<dyn KeyStore>,
    pub ledger: Arc<dyn UsageLedger>,
    pub engine: Arc<dyn GenerationEngine>,
    pub limits: PlanLimits,
    /// Shared secret for the admin listing; `None` disables it.
    pub admin_key: Option<Arc<str>>,
}
