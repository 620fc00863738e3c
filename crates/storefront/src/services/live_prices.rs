//! Live price snapshot kept fresh by a background refresh task.
//!
//! The shared snapshot is an `Arc<PriceSnapshot>` behind a lock that is only
//! held long enough to clone or swap the `Arc`, so readers always get a
//! complete snapshot and never wait on a fetch.
//!
//! The refresh loop awaits each fetch before waiting for the next tick, so
//! at most one fetch is in flight. Missed ticks are skipped rather than
//! bunched up. A failed fetch keeps the previous snapshot.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use basketwise_core::{PriceSnapshot, SnapshotFilter};

use super::prices::{PriceSource, SourceError};

/// Handle to the current live snapshot. Cheap to clone.
#[derive(Clone, Default)]
pub struct LivePrices {
    inner: Arc<RwLock<Option<Arc<PriceSnapshot>>>>,
}

impl LivePrices {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest snapshot, or `None` before the first successful fetch.
    #[must_use]
    pub fn current(&self) -> Option<Arc<PriceSnapshot>> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }

    /// Whether a snapshot has been loaded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Atomically replace the snapshot.
    pub fn replace(&self, snapshot: PriceSnapshot) {
        let snapshot = Arc::new(snapshot);
        match self.inner.write() {
            Ok(mut guard) => *guard = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
    }

    /// Fetch once from `source` and install the result.
    ///
    /// # Errors
    ///
    /// Returns the source error; the previous snapshot stays in place.
    #[instrument(skip_all)]
    pub async fn refresh(&self, source: &dyn PriceSource) -> Result<(), SourceError> {
        let snapshot = source.fetch_snapshot(&SnapshotFilter::default()).await?;
        debug!(
            products = snapshot.products.len(),
            stores = snapshot.stores.len(),
            "Live price snapshot refreshed"
        );
        self.replace(snapshot);
        Ok(())
    }

    /// Spawn the periodic refresh task. The first fetch starts immediately.
    ///
    /// The task runs until the returned handle is stopped or dropped.
    #[must_use]
    pub fn spawn_refresh(&self, source: Arc<dyn PriceSource>, every: Duration) -> RefreshTask {
        let prices = self.clone();
        info!(interval_secs = every.as_secs(), "Starting live price refresh");

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if let Err(e) = prices.refresh(source.as_ref()).await {
                    warn!(error = %e, "Live price refresh failed, keeping previous snapshot");
                }
            }
        });

        RefreshTask { handle }
    }
}

/// Cancellable handle to the refresh task. Dropping it stops the task.
pub struct RefreshTask {
    handle: JoinHandle<()>,
}

impl RefreshTask {
    /// Stop refreshing. An in-flight fetch is cancelled.
    pub fn stop(self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
