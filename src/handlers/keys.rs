//! Key registration and usage statistics.
//!
//! - POST /api/signup - Issue a free key for an email address
//! - GET /api/stats - Usage summary for the presented key

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    handlers::credential::credential_from_headers,
    models::{
        access_key::{SignupRequest, SignupResponse},
        usage::UsageSummary,
    },
    services::{key_issuer, usage_service},
    state::AppState,
};

/// Register an email address and issue it a free key.
///
/// # Request Body
///
/// ```json
/// { "email": "ana@example.com" }
/// ```
///
/// # Response
///
/// - **201 Created**: `{ "api_key": "tm_free_...", "plan": "free", "expires_at": null }`.
///   The key is shown only in this response.
/// - **400**: not an email address
/// - **409**: the address already has a key
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let issued = key_issuer::issue(state.keys.as_ref(), &request.email).await?;

    Ok((StatusCode::CREATED, Json(SignupResponse::from(issued))))
}

/// Usage summary for the presented key.
///
/// # Authentication
///
/// Required: `Authorization: Bearer <key>` or `api-key: <key>`.
///
/// # Response (200)
///
/// ```json
/// {
///   "owner": "ana@example.com",
///   "plan": "free",
///   "used_today": 4,
///   "used_total": 27,
///   "limit": 10,
///   "remaining": 6
/// }
/// ```
pub async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UsageSummary>, AppError> {
    let key = credential_from_headers(&headers)?
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(AppError::InvalidCredential)?;

    let summary = usage_service::get_usage_summary(
        state.keys.as_ref(),
        state.ledger.as_ref(),
        state.limits,
        key,
    )
    .await?;

    Ok(Json(summary))
}
