//! Shopping cart state.
//!
//! The cart is a plain value owned by whoever holds the shopping session.
//! It stores product ids only; [`Cart::resolve`] borrows the matching
//! products out of a price snapshot to produce the [`CartLine`]s that the
//! store comparison works on.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::Product;
use super::id::ProductId;

/// Errors raised when building or resolving a cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("quantity must be a positive integer")]
    ZeroQuantity,
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),
}

/// A positive item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// One unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// # Errors
    ///
    /// Returns `CartError::ZeroQuantity` for 0.
    pub fn new(count: u32) -> Result<Self, CartError> {
        NonZeroU32::new(count).map(Self).ok_or(CartError::ZeroQuantity)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Saturating addition, used when the same product is added twice.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0.get()))
    }
}

impl TryFrom<u32> for Quantity {
    type Error = CartError;

    fn try_from(count: u32) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.get()
    }
}

/// One entry of the session cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// A cart line resolved against a snapshot: the product plus its quantity.
#[derive(Debug, Clone, Copy)]
pub struct CartLine<'a> {
    pub product: &'a Product,
    pub quantity: Quantity,
}

/// Ordered list of cart items. Each product appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` of a product, merging with an existing line.
    pub fn add(&mut self, product_id: ProductId, quantity: Quantity) {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.items.push(CartItem {
                product_id,
                quantity,
            }),
        }
    }

    /// Replace the quantity of a product, adding it if absent.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: Quantity) {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => item.quantity = quantity,
            None => self.items.push(CartItem {
                product_id,
                quantity,
            }),
        }
    }

    /// Remove a product. Returns whether it was present.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    /// Borrow the cart's products out of `products`, preserving cart order.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownProduct` for the first item whose product
    /// is not in `products`.
    pub fn resolve<'a>(&self, products: &'a [Product]) -> Result<Vec<CartLine<'a>>, CartError> {
        self.items
            .iter()
            .map(|item| {
                products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .map(|product| CartLine {
                        product,
                        quantity: item.quantity,
                    })
                    .ok_or(CartError::UnknownProduct(item.product_id))
            })
            .collect()
    }
}
