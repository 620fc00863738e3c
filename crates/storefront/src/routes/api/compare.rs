//! Best-store-for-cart endpoint.
//!
//! Runs against the live price snapshot rather than the database, so the
//! UI can call it on every cart change.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use basketwise_core::compare::compare;
use basketwise_core::{Cart, ProductId, Quantity, StoreAnalysis, StoreId};

use crate::error::{AppError, Result};
use crate::middleware::RequireBearer;
use crate::state::AppState;

/// One requested cart item.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Request body for `POST /api/compare`.
#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub items: Vec<CompareItem>,
}

impl CompareRequest {
    /// Build a cart, merging repeated products.
    fn into_cart(self) -> Result<Cart> {
        let mut cart = Cart::new();
        for item in self.items {
            cart.add(item.product_id, Quantity::new(item.quantity)?);
        }
        Ok(cart)
    }
}

/// Store analysis display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAnalysisView {
    pub store_id: StoreId,
    pub store_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub available_count: usize,
    pub unavailable_items: Vec<String>,
    pub fully_available: bool,
}

impl From<StoreAnalysis> for StoreAnalysisView {
    fn from(a: StoreAnalysis) -> Self {
        let fully_available = a.is_fully_available();
        Self {
            store_id: a.store_id,
            store_name: a.store_name,
            total: a.total,
            available_count: a.available_count,
            unavailable_items: a.unavailable_items,
            fully_available,
        }
    }
}

/// Response body for `POST /api/compare`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub stores: Vec<StoreAnalysisView>,
    pub best_store: Option<StoreAnalysisView>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub savings: Option<Decimal>,
}

/// Rank stores for the posted cart.
#[instrument(skip_all)]
pub async fn compare_cart(
    State(state): State<AppState>,
    RequireBearer(_claims): RequireBearer,
    payload: std::result::Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<CompareResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let cart = request.into_cart()?;

    let snapshot = state.live().current().ok_or(AppError::NotReady)?;
    let lines = cart.resolve(&snapshot.products)?;
    let comparison = compare(&lines, &snapshot.stores);
    debug!(
        lines = lines.len(),
        stores = comparison.stores.len(),
        "Cart compared"
    );

    let stores: Vec<StoreAnalysisView> = comparison
        .stores
        .into_iter()
        .map(StoreAnalysisView::from)
        .collect();

    Ok(Json(CompareResponse {
        best_store: stores.first().cloned(),
        stores,
        savings: comparison.savings,
    }))
}
