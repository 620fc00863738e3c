//! Application state shared across handlers.

use std::sync::Arc;

use jsonwebtoken::DecodingKey;
use secrecy::ExposeSecret;

use crate::config::StorefrontConfig;
use crate::services::{LivePrices, PriceSource};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// price source, the live price snapshot and the bearer-token key.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    prices: Arc<dyn PriceSource>,
    live: LivePrices,
    decoding_key: DecodingKey,
}

impl AppState {
    /// Create application state from configuration.
    #[must_use]
    pub fn new(config: &StorefrontConfig, prices: Arc<dyn PriceSource>) -> Self {
        Self::with_jwt_secret(config.jwt_secret.expose_secret().as_bytes(), prices)
    }

    /// Create application state with an explicit HS256 secret.
    #[must_use]
    pub fn with_jwt_secret(secret: &[u8], prices: Arc<dyn PriceSource>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                prices,
                live: LivePrices::new(),
                decoding_key: DecodingKey::from_secret(secret),
            }),
        }
    }

    /// Get the price data source.
    #[must_use]
    pub fn prices(&self) -> &dyn PriceSource {
        self.inner.prices.as_ref()
    }

    /// Get a shared handle to the price data source.
    #[must_use]
    pub fn prices_handle(&self) -> Arc<dyn PriceSource> {
        Arc::clone(&self.inner.prices)
    }

    /// Get the live price snapshot handle.
    #[must_use]
    pub fn live(&self) -> &LivePrices {
        &self.inner.live
    }

    /// Get the key used to verify bearer tokens.
    #[must_use]
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.inner.decoding_key
    }
}
