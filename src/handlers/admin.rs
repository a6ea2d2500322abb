//! Administrative key listing.
//!
//! Protected only by a static shared secret in the `admin-key` header. This
//! is a convenience for operators, not production-grade access control.

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::access_key::{AdminKeyList, AdminKeyView},
    services::usage_service::{self, MAX_ADMIN_PAGE},
    state::AppState,
};

pub const ADMIN_KEY_HEADER: &str = "admin-key";

#[derive(Debug, Deserialize)]
pub struct ListKeysParams {
    pub limit: Option<i64>,
}

/// List the most recently created keys.
///
/// # Endpoint
///
/// `GET /admin/keys?limit=N` (N defaults to and is capped at 100)
///
/// # Response
///
/// - **200**: `{ "keys": [{ "owner_contact", "plan", "created_at", "expires_at", "is_active" }], "total": n }`
/// - **403**: missing or wrong `admin-key`, or no admin key configured
pub async fn list_keys(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListKeysParams>,
) -> Result<Json<AdminKeyList>, AppError> {
    let presented = headers.get(ADMIN_KEY_HEADER).and_then(|h| h.to_str().ok());

    let keys = usage_service::list_recent_keys(
        state.keys.as_ref(),
        state.admin_key.as_deref(),
        presented,
        params.limit.unwrap_or(MAX_ADMIN_PAGE),
    )
    .await?;

    let keys: Vec<AdminKeyView> = keys.into_iter().map(Into::into).collect();

    Ok(Json(AdminKeyList {
        total: keys.len(),
        keys,
    }))
}
