//! Price snapshot endpoint.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use basketwise_core::{
    PriceRange, PriceSnapshot, Product, ProductId, SnapshotFilter, SnapshotMeta, Store, StoreId,
    StoreQuote,
};

use crate::error::Result;
use crate::middleware::RequireBearer;
use crate::state::AppState;

/// Query parameters for `GET /api/prices`.
///
/// Kept as raw strings so a bad id is ignored instead of failing the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricesQuery {
    pub category: Option<String>,
    pub store_id: Option<String>,
    pub product_id: Option<String>,
}

impl From<PricesQuery> for SnapshotFilter {
    fn from(q: PricesQuery) -> Self {
        Self {
            category: q
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all")),
            store_id: q.store_id.and_then(|s| s.parse::<StoreId>().ok()),
            product_id: q.product_id.and_then(|s| s.parse::<ProductId>().ok()),
        }
    }
}

/// Quote display data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteView {
    pub store_id: StoreId,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub is_available: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_percent: Decimal,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&StoreQuote> for QuoteView {
    fn from(q: &StoreQuote) -> Self {
        Self {
            store_id: q.store_id,
            price: q.price,
            is_available: q.available,
            discount_percent: q.discount_percent,
            updated_at: q.updated_at,
        }
    }
}

/// Price range display data.
#[derive(Debug, Serialize)]
pub struct PriceRangeView {
    #[serde(with = "rust_decimal::serde::float")]
    pub min: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max: Decimal,
}

impl From<PriceRange> for PriceRangeView {
    fn from(r: PriceRange) -> Self {
        Self {
            min: r.min,
            max: r.max,
        }
    }
}

/// Product display data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_price: Decimal,
    pub image_url: Option<String>,
    pub prices: Vec<QuoteView>,
    pub price_range: Option<PriceRangeView>,
}

impl From<&Product> for ProductView {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            category: p.category.clone(),
            unit: p.unit.clone(),
            base_price: p.base_price,
            image_url: p.image_url.clone(),
            prices: p.quotes.iter().map(QuoteView::from).collect(),
            price_range: p.price_range().map(PriceRangeView::from),
        }
    }
}

/// Store display data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreView {
    pub id: StoreId,
    pub name: String,
    pub logo_url: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub delivery_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_order: Decimal,
}

impl From<&Store> for StoreView {
    fn from(s: &Store) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            logo_url: s.logo_url.clone(),
            rating: s.rating,
            delivery_fee: s.delivery_fee,
            min_order: s.min_order,
        }
    }
}

/// Response body for `GET /api/prices`.
#[derive(Debug, Serialize)]
pub struct PricesResponse {
    pub products: Vec<ProductView>,
    pub stores: Vec<StoreView>,
    pub meta: SnapshotMeta,
}

impl From<&PriceSnapshot> for PricesResponse {
    fn from(snapshot: &PriceSnapshot) -> Self {
        Self {
            products: snapshot.products.iter().map(ProductView::from).collect(),
            stores: snapshot.stores.iter().map(StoreView::from).collect(),
            meta: snapshot.meta(),
        }
    }
}

/// Current prices, optionally filtered by category, store or product.
#[instrument(skip_all)]
pub async fn snapshot(
    State(state): State<AppState>,
    RequireBearer(_claims): RequireBearer,
    Query(query): Query<PricesQuery>,
) -> Result<Json<PricesResponse>> {
    let filter = SnapshotFilter::from(query);
    let snapshot = state.prices().fetch_snapshot(&filter).await?;
    Ok(Json(PricesResponse::from(&snapshot)))
}
