//! Payment-provider webhook.
//!
//! Plan changes driven by payments are not processed yet. The endpoint exists
//! so the provider can be pointed at it; events are acknowledged and dropped.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

// TODO: verify the provider signature and update `plan` / `external_billing_ref`
// on subscription events once a payment provider is chosen.
pub async fn billing_webhook() -> impl IntoResponse {
    tracing::info!("Billing webhook received; processing not implemented");

    (
        StatusCode::ACCEPTED,
        Json(json!({ "status": "pending_implementation" })),
    )
}
