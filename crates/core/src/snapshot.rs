//! A complete, consistent read of the catalog.
//!
//! Snapshots are built once per data-source read and never edited in
//! place; filtering produces a new snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductId, Store, StoreId};

/// Products with their quotes, the stores quoting them, and the read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub products: Vec<Product>,
    pub stores: Vec<Store>,
    pub last_updated: DateTime<Utc>,
}

/// Optional filters for a price snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotFilter {
    /// Case-insensitive exact category match.
    pub category: Option<String>,
    /// Keep only this store and its quotes.
    pub store_id: Option<StoreId>,
    pub product_id: Option<ProductId>,
}

/// Counts reported next to a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub total_products: usize,
    pub total_stores: usize,
    pub last_updated: DateTime<Utc>,
}

impl SnapshotFilter {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.category.is_none() && self.store_id.is_none() && self.product_id.is_none()
    }

    /// Whether `product` passes the category and product filters.
    #[must_use]
    pub fn admits_product(&self, product: &Product) -> bool {
        self.category
            .as_deref()
            .is_none_or(|c| product.in_category(c))
            && self.product_id.is_none_or(|id| product.id == id)
    }
}

impl PriceSnapshot {
    #[must_use]
    pub fn new(products: Vec<Product>, stores: Vec<Store>) -> Self {
        Self {
            products,
            stores,
            last_updated: Utc::now(),
        }
    }

    #[must_use]
    pub fn meta(&self) -> SnapshotMeta {
        SnapshotMeta {
            total_products: self.products.len(),
            total_stores: self.stores.len(),
            last_updated: self.last_updated,
        }
    }

    /// Apply `filter`, returning a new snapshot with the same read time.
    ///
    /// With a store filter, products that store does not quote are dropped.
    #[must_use]
    pub fn filtered(&self, filter: &SnapshotFilter) -> Self {
        let products = self
            .products
            .iter()
            .filter(|p| filter.admits_product(p))
            .filter_map(|p| match filter.store_id {
                None => Some(p.clone()),
                Some(store) => {
                    let quote = p.quote_for(store)?.clone();
                    Some(Product {
                        quotes: vec![quote],
                        ..p.clone()
                    })
                }
            })
            .collect();

        let stores = self
            .stores
            .iter()
            .filter(|s| filter.store_id.is_none_or(|id| s.id == id))
            .cloned()
            .collect();

        Self {
            products,
            stores,
            last_updated: self.last_updated,
        }
    }
}
