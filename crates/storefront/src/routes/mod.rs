//! HTTP route handlers for the price comparison service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Ready once the first live snapshot is loaded
//!
//! # API (bearer token required)
//! POST /api/deals              - Best current deals, optional JSON filter body
//! GET  /api/prices             - Price snapshot (?category=&storeId=&productId=)
//! POST /api/compare            - Rank stores for a cart
//! ```

pub mod api;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::from_fn,
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{rate_limited, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable until the live price snapshot has been
/// loaded at least once.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.live().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

fn build(state: AppState, api: Router) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest_service("/api", api)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    client = tracing::field::Empty,
                )
            }),
        )
        .layer(cors_layer())
        .with_state(state)
}

/// Build the application router without rate limiting.
///
/// Used by in-process tests, where requests carry no client IP headers.
pub fn app(state: AppState) -> Router {
    build(state.clone(), api::api_routes().with_state(state))
}

/// Build the application router with per-client rate limiting on `/api`.
///
/// Clients are keyed by proxy IP headers, then by peer address, so the
/// server must be run with `into_make_service_with_connect_info`. Requests
/// carrying neither are served without a limit.
pub fn app_with_rate_limit(state: AppState) -> Router {
    build(state.clone(), rate_limited(api::api_routes(), state))
}
