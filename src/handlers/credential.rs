//! Request credentials.
//!
//! Reads the optional access key from the request headers and resolves it to
//! a [`Caller`]. Requests without a key are the anonymous caller; a key that
//! is present but unknown, inactive, expired or unreadable is rejected with
//! 401.

use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

use crate::{
    error::{AppError, AuthError},
    models::identity::Caller,
    services::identity,
    state::AppState,
};

/// Alternative header carrying the bare key.
pub const API_KEY_HEADER: &str = "api-key";

/// Extract the presented key, if any.
///
/// Accepted forms:
/// ```text
/// Authorization: Bearer tm_free_3f9a...
/// api-key: tm_free_3f9a...
/// ```
/// An `Authorization` header in any other scheme is returned whole, so it
/// fails resolution instead of falling back to anonymous. A header whose
/// value is not visible ASCII is `InvalidCredential`.
pub fn credential_from_headers(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = header_text(value)?;
        return Ok(Some(value.strip_prefix("Bearer ").unwrap_or(value)));
    }

    headers.get(API_KEY_HEADER).map(header_text).transpose()
}

fn header_text(value: &HeaderValue) -> Result<&str, AuthError> {
    value.to_str().map_err(|_| AuthError::InvalidCredential)
}

/// Resolve the caller a request is counted against.
pub async fn caller_from_headers(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Caller, AppError> {
    let credential = credential_from_headers(headers)?;

    Ok(identity::resolve(state.keys.as_ref(), state.limits, credential).await?)
}
