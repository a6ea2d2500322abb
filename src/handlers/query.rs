//! Metered generation queries.

use axum::{Json, extract::State, http::HeaderMap};

use crate::{
    error::AppError,
    handlers::credential::caller_from_headers,
    models::query::{QueryRequest, QueryResponse},
    services::quota,
    state::AppState,
};

/// Answer a prompt, charging one request to the caller's daily quota.
///
/// # Endpoint
///
/// `POST /api/query`
///
/// # Authentication
///
/// Optional. Without a key the request counts against the shared anonymous
/// bucket on the free plan.
///
/// # Response
///
/// - **200**: `{ "success": true, "text": ..., "elapsed_seconds": ..., "remaining": ... }`
/// - **400**: prompt shorter than 3 or longer than 500 characters
/// - **401**: unknown, inactive, expired or unreadable key
/// - **429**: daily quota used up
/// - **502**: the generation engine failed (its message is passed through)
///
/// The prompt is checked before the key, so a bad prompt is a 400 whatever
/// key it carries. The request is charged once admitted. A failed
/// generation is not refunded.
pub async fn query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    request.validate().map_err(AppError::InvalidRequest)?;

    let caller = caller_from_headers(&state, &headers).await?;

    let decision =
        quota::check_and_consume(state.ledger.as_ref(), &caller.identity, caller.limit).await?;

    if !decision.allowed {
        return Err(AppError::QuotaExceeded {
            limit: caller.limit,
        });
    }

    let generation = state.engine.generate(&request.prompt).await?;

    Ok(Json(QueryResponse {
        success: true,
        text: generation.text,
        elapsed_seconds: generation.elapsed_seconds,
        remaining: decision.remaining,
    }))
}
