//! HTTP router.

use axum::{
    Router,
    http::{
        HeaderName, HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{self, admin::ADMIN_KEY_HEADER, credential::API_KEY_HEADER},
    state::AppState,
};

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::health_check))
        .route("/health", get(handlers::health::health_check))
        .route("/api/query", post(handlers::query::query))
        .route("/api/signup", post(handlers::keys::signup))
        .route("/api/stats", get(handlers::keys::stats))
        .route("/admin/keys", get(handlers::admin::list_keys))
        .route("/webhook/billing", post(handlers::billing::billing_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for browser front-ends served from `origins`.
///
/// Origins that are not valid header values are skipped. With no origins,
/// cross-origin browser requests are refused.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
            HeaderName::from_static(ADMIN_KEY_HEADER),
        ])
        .allow_credentials(true)
}
