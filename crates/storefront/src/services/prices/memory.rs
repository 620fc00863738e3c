//! In-memory price source.

use std::sync::RwLock;

use async_trait::async_trait;

use basketwise_core::{PriceSnapshot, Product, SnapshotFilter, Store, StoreId};

use super::{PriceSource, SourceError};

/// Serves a snapshot held in memory.
///
/// The snapshot can be swapped at runtime, or cleared to make every read
/// fail, which is how tests simulate an upstream outage.
#[derive(Debug, Default)]
pub struct StaticPriceSource {
    snapshot: RwLock<Option<PriceSnapshot>>,
}

impl StaticPriceSource {
    #[must_use]
    pub const fn new(snapshot: PriceSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Some(snapshot)),
        }
    }

    /// A source whose every read fails.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            snapshot: RwLock::new(None),
        }
    }

    /// Replace the served snapshot.
    pub fn set_snapshot(&self, snapshot: PriceSnapshot) {
        if let Ok(mut guard) = self.snapshot.write() {
            *guard = Some(snapshot);
        }
    }

    /// Make subsequent reads fail.
    pub fn set_unavailable(&self) {
        if let Ok(mut guard) = self.snapshot.write() {
            *guard = None;
        }
    }

    fn read(&self, filter: &SnapshotFilter) -> Result<PriceSnapshot, SourceError> {
        let guard = self
            .snapshot
            .read()
            .map_err(|_| SourceError::Unavailable("snapshot lock poisoned".to_string()))?;
        guard
            .as_ref()
            .map(|snapshot| snapshot.filtered(filter))
            .ok_or_else(|| SourceError::Unavailable("no snapshot loaded".to_string()))
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    async fn fetch_stores(&self, store_id: Option<StoreId>) -> Result<Vec<Store>, SourceError> {
        let filter = SnapshotFilter {
            store_id,
            ..SnapshotFilter::default()
        };
        Ok(self.read(&filter)?.stores)
    }

    async fn fetch_products(&self, filter: &SnapshotFilter) -> Result<Vec<Product>, SourceError> {
        Ok(self.read(filter)?.products)
    }
}
