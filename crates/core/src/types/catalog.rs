//! Catalog entities: products, stores and the price quotes linking them.
//!
//! Quotes are supplied by the price data source and never mutated here; a
//! product only exposes read access to them plus the derived price range.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, StoreId};

/// A store's offered price and availability for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreQuote {
    pub product_id: ProductId,
    pub store_id: StoreId,
    /// Current price in the store.
    pub price: Decimal,
    /// Whether the store can currently supply the product.
    pub available: bool,
    /// Advertised discount percentage (0 when not on offer).
    pub discount_percent: Decimal,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoreQuote {
    /// True when the quote is on offer and can be bought.
    #[must_use]
    pub fn is_live_discount(&self) -> bool {
        self.available && self.discount_percent > Decimal::ZERO
    }
}

/// A grocery store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub logo_url: Option<String>,
    /// Average customer rating (0-5).
    pub rating: Decimal,
    pub delivery_fee: Decimal,
    pub min_order: Decimal,
}

/// Lowest and highest quoted price for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

/// A product with the quotes every store has published for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Category tag, e.g. "dairy" or "vegetables".
    pub category: String,
    /// Unit label, e.g. "1 kg" or "500 ml".
    pub unit: String,
    /// Maximum retail price; the pre-discount baseline for savings.
    pub base_price: Decimal,
    pub image_url: Option<String>,
    pub quotes: Vec<StoreQuote>,
}

impl Product {
    /// The quote published by `store`, if any.
    #[must_use]
    pub fn quote_for(&self, store: StoreId) -> Option<&StoreQuote> {
        self.quotes.iter().find(|q| q.store_id == store)
    }

    /// Min/max across all quotes, or `None` if no store quotes the product.
    #[must_use]
    pub fn price_range(&self) -> Option<PriceRange> {
        let mut prices = self.quotes.iter().map(|q| q.price);
        let first = prices.next()?;
        Some(prices.fold(
            PriceRange {
                min: first,
                max: first,
            },
            |range, price| PriceRange {
                min: range.min.min(price),
                max: range.max.max(price),
            },
        ))
    }

    /// Case-insensitive category comparison.
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category)
    }
}
