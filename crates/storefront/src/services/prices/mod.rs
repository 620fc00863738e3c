//! Price data sources.
//!
//! The API never talks to storage directly; it goes through [`PriceSource`].
//! Production uses the `PostgreSQL` implementation in [`crate::db::prices`];
//! tests and local demos use [`StaticPriceSource`].
//!
//! A source either returns a complete result or an error. Callers abort the
//! request on error and never serve a partial list.

mod memory;

pub use memory::StaticPriceSource;

use async_trait::async_trait;
use thiserror::Error;

use basketwise_core::{PriceSnapshot, Product, SnapshotFilter, Store, StoreId};

/// Errors reading product, price or store data.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Database query failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The source has no data to serve.
    #[error("Price data unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the catalog: stores, products and their quotes.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Stores, optionally restricted to one id.
    async fn fetch_stores(&self, store_id: Option<StoreId>) -> Result<Vec<Store>, SourceError>;

    /// Products with their quotes attached.
    ///
    /// With a store filter, only that store's quotes are attached and
    /// products it does not quote are omitted.
    async fn fetch_products(&self, filter: &SnapshotFilter) -> Result<Vec<Product>, SourceError>;

    /// Products and stores read together into one snapshot.
    async fn fetch_snapshot(&self, filter: &SnapshotFilter) -> Result<PriceSnapshot, SourceError> {
        let products = self.fetch_products(filter).await?;
        let stores = self.fetch_stores(filter.store_id).await?;
        Ok(PriceSnapshot::new(products, stores))
    }
}
