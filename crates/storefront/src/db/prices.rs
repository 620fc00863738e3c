//! `PostgreSQL` price source.
//!
//! Products and quotes are read in two queries and stitched together in
//! memory; quote ordering is by store id so snapshot output is stable.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};

use basketwise_core::{Product, ProductId, SnapshotFilter, Store, StoreId, StoreQuote};

use crate::services::prices::{PriceSource, SourceError};

#[derive(Debug, FromRow)]
struct StoreRow {
    id: i32,
    name: String,
    logo_url: Option<String>,
    rating: Decimal,
    delivery_fee: Decimal,
    min_order: Decimal,
}

impl From<StoreRow> for Store {
    fn from(r: StoreRow) -> Self {
        Self {
            id: StoreId::new(r.id),
            name: r.name,
            logo_url: r.logo_url,
            rating: r.rating,
            delivery_fee: r.delivery_fee,
            min_order: r.min_order,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    category: String,
    unit: String,
    base_price: Decimal,
    image_url: Option<String>,
}

#[derive(Debug, FromRow)]
struct QuoteRow {
    product_id: i32,
    store_id: i32,
    price: Decimal,
    is_available: bool,
    discount_percent: Decimal,
    updated_at: DateTime<Utc>,
}

impl From<QuoteRow> for StoreQuote {
    fn from(r: QuoteRow) -> Self {
        Self {
            product_id: ProductId::new(r.product_id),
            store_id: StoreId::new(r.store_id),
            price: r.price,
            available: r.is_available,
            discount_percent: r.discount_percent,
            updated_at: Some(r.updated_at),
        }
    }
}

/// Price source backed by the `catalog` schema.
#[derive(Clone)]
pub struct PgPriceSource {
    pool: PgPool,
}

impl PgPriceSource {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceSource for PgPriceSource {
    #[instrument(skip(self))]
    async fn fetch_stores(&self, store_id: Option<StoreId>) -> Result<Vec<Store>, SourceError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, name, logo_url, rating, delivery_fee, min_order
            FROM catalog.stores
            WHERE ($1::int4 IS NULL OR id = $1)
            ORDER BY id
            ",
        )
        .bind(store_id.map(|id| id.as_i32()))
        .fetch_all(&self.pool)
        .await?;

        debug!(stores = rows.len(), "Fetched stores");
        Ok(rows.into_iter().map(Store::from).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_products(&self, filter: &SnapshotFilter) -> Result<Vec<Product>, SourceError> {
        let products = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, category, unit, base_price, image_url
            FROM catalog.products
            WHERE ($1::text IS NULL OR lower(category) = lower($1))
              AND ($2::int4 IS NULL OR id = $2)
            ORDER BY id
            ",
        )
        .bind(filter.category.as_deref())
        .bind(filter.product_id.map(|id| id.as_i32()))
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
        let quotes = sqlx::query_as::<_, QuoteRow>(
            r"
            SELECT product_id, store_id, price, is_available, discount_percent, updated_at
            FROM catalog.product_prices
            WHERE product_id = ANY($1)
              AND ($2::int4 IS NULL OR store_id = $2)
            ORDER BY product_id, store_id
            ",
        )
        .bind(ids.as_slice())
        .bind(filter.store_id.map(|id| id.as_i32()))
        .fetch_all(&self.pool)
        .await?;

        debug!(
            products = products.len(),
            quotes = quotes.len(),
            "Fetched products and quotes"
        );
        Ok(attach_quotes(products, quotes, filter.store_id.is_some()))
    }
}

/// Group quotes under their products, keeping product order.
///
/// With `require_quote`, products left without any quote are dropped.
fn attach_quotes(
    products: Vec<ProductRow>,
    quotes: Vec<QuoteRow>,
    require_quote: bool,
) -> Vec<Product> {
    let mut by_product: HashMap<i32, Vec<StoreQuote>> = HashMap::new();
    for quote in quotes {
        by_product
            .entry(quote.product_id)
            .or_default()
            .push(quote.into());
    }

    products
        .into_iter()
        .filter_map(|row| {
            let quotes = by_product.remove(&row.id).unwrap_or_default();
            if require_quote && quotes.is_empty() {
                return None;
            }
            Some(Product {
                id: ProductId::new(row.id),
                name: row.name,
                category: row.category,
                unit: row.unit,
                base_price: row.base_price,
                image_url: row.image_url,
                quotes,
            })
        })
        .collect()
}
