//! Core types for Basketwise.
//!
//! This module provides type-safe wrappers for the grocery domain.

pub mod cart;
pub mod catalog;
pub mod id;
pub mod money;

pub use cart::{Cart, CartError, CartItem, CartLine, Quantity};
pub use catalog::{PriceRange, Product, Store, StoreQuote};
pub use id::*;
pub use money::round_to_unit;
