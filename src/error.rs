//! Error types and HTTP error response handling.
//!
//! Each component returns its own typed error. `AppError` is the HTTP
//! boundary type: components' errors convert into it and it renders itself as
//! a JSON error response with the matching status code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failure of the persistence layer.
///
/// Always fatal for the current request: nothing is admitted and nothing is
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store could not be reached (e.g. a poisoned in-process lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be interpreted.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Failure to resolve a credential to an identity.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The key is unknown, inactive or expired.
    #[error("Invalid API key")]
    InvalidCredential,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure to issue a new access key.
#[derive(Debug, thiserror::Error)]
pub enum IssuanceError {
    /// A key was already issued to this owner, active or not.
    #[error("A key is already registered for this contact")]
    DuplicateOwner,

    #[error("Invalid contact: {0}")]
    InvalidOwner(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure of the administrative listing.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("Not authorized")]
    Forbidden,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure reported by the generation engine.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation engine is not configured")]
    Unconfigured,

    #[error("generation request failed: {0}")]
    Request(String),

    #[error("generation engine returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("unexpected generation response: {0}")]
    Malformed(String),
}

/// Application-wide HTTP error type.
///
/// # Status Code Mapping
///
/// - `InvalidCredential` → 401 Unauthorized
/// - `Forbidden` → 403 Forbidden
/// - `DuplicateOwner` → 409 Conflict
/// - `QuotaExceeded` → 429 Too Many Requests
/// - `InvalidRequest` → 400 Bad Request
/// - `Generation` → 502 Bad Gateway (message passed through)
/// - `Storage` → 500 Internal Server Error (hides details from client)
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid API key")]
    InvalidCredential,

    #[error("Not authorized")]
    Forbidden,

    #[error("A key is already registered for this contact")]
    DuplicateOwner,

    /// The caller's daily quota is used up. This is a normal decision, not a
    /// fault; the client should retry tomorrow or upgrade.
    #[error("Daily limit of {limit} requests reached. Upgrade to Pro for unlimited queries.")]
    QuotaExceeded { limit: i64 },

    #[error("Invalid request")]
    InvalidRequest(String),

    #[error("{0}")]
    Generation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredential => AppError::InvalidCredential,
            AuthError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl From<IssuanceError> for AppError {
    fn from(err: IssuanceError) -> Self {
        match err {
            IssuanceError::DuplicateOwner => AppError::DuplicateOwner,
            IssuanceError::InvalidOwner(msg) => AppError::InvalidRequest(msg),
            IssuanceError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Forbidden => AppError::Forbidden,
            AdminError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        AppError::Generation(err.to_string())
    }
}

/// Convert AppError into an HTTP response.
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                "invalid_api_key",
                self.to_string(),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            AppError::DuplicateOwner => (StatusCode::CONFLICT, "duplicate_owner", self.to_string()),
            AppError::QuotaExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "quota_exceeded",
                self.to_string(),
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Generation(ref msg) => {
                tracing::error!("Generation failed: {}", msg);
                (StatusCode::BAD_GATEWAY, "generation_failed", msg.clone())
            }
            AppError::Storage(ref e) => {
                tracing::error!("Storage failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
