//! Basketwise Core - Domain types and price comparison logic.
//!
//! This crate is shared by the Basketwise crates:
//! - `storefront` - JSON API serving live prices, deals and cart comparison
//! - `integration-tests` - Fixtures and router-level tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure computations - no I/O, no
//! database access, no HTTP. Everything here operates on data that has
//! already been materialized in memory, so it can be called synchronously
//! on every cart or filter change.
//!
//! # Modules
//!
//! - [`types`] - Ids, money rounding, catalog entities and the shopping cart
//! - [`compare`] - Ranks stores by what a cart would cost at each of them
//! - [`deals`] - Finds and ranks discounted quotes
//! - [`snapshot`] - A complete read of products and stores, plus filters

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod compare;
pub mod deals;
pub mod snapshot;
pub mod types;

pub use compare::{Comparison, StoreAnalysis};
pub use deals::{Deal, DealFilter, DealQuality};
pub use snapshot::{PriceSnapshot, SnapshotFilter, SnapshotMeta};
pub use types::*;
