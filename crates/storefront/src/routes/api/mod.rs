//! JSON API handlers.
//!
//! Every handler takes [`RequireBearer`](crate::middleware::RequireBearer)
//! before any body extractor, so unauthenticated requests are rejected
//! before the body is read or any price data is fetched.

pub mod compare;
pub mod deals;
pub mod prices;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the `/api` routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/deals", post(deals::find))
        .route("/prices", get(prices::snapshot))
        .route("/compare", post(compare::compare_cart))
}
