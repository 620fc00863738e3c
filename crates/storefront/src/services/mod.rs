//! Business logic services for storefront.
//!
//! # Services
//!
//! - `prices` - The [`prices::PriceSource`] seam over catalog storage
//! - `live_prices` - Periodically refreshed in-memory price snapshot

pub mod live_prices;
pub mod prices;

pub use live_prices::{LivePrices, RefreshTask};
pub use prices::{PriceSource, SourceError, StaticPriceSource};
