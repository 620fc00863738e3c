//! Deal finder endpoint.

use axum::{Json, body::Bytes, extract::State};
use serde::Serialize;
use tracing::{debug, info, instrument};

use basketwise_core::deals::find_deals;
use basketwise_core::{Deal, DealFilter, SnapshotFilter};

use crate::error::Result;
use crate::middleware::RequireBearer;
use crate::state::AppState;

/// Response body for `POST /api/deals`.
#[derive(Debug, Serialize)]
pub struct DealsResponse {
    pub deals: Vec<Deal>,
}

/// Parse the optional filter body. Anything unparseable means "no filters".
fn parse_filter(body: &[u8]) -> DealFilter {
    if body.iter().all(u8::is_ascii_whitespace) {
        return DealFilter::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!(error = %e, "Ignoring malformed deal filter body");
        DealFilter::default()
    })
}

/// Find the best current deals.
///
/// Reads fresh data from the price source; any read failure fails the
/// whole request.
#[instrument(skip_all)]
pub async fn find(
    State(state): State<AppState>,
    RequireBearer(_claims): RequireBearer,
    body: Bytes,
) -> Result<Json<DealsResponse>> {
    let filter = parse_filter(&body);
    let snapshot = state
        .prices()
        .fetch_snapshot(&SnapshotFilter::default())
        .await?;

    let deals = find_deals(&snapshot.products, &snapshot.stores, &filter);
    info!(
        deals = deals.len(),
        category = filter.category.as_deref().unwrap_or("all"),
        "Deal search complete"
    );

    Ok(Json(DealsResponse { deals }))
}
