//! Deal finder.
//!
//! Scans every available, discounted quote, measures it against the
//! product's MRP and returns the best [`MAX_DEALS`] offers, highest
//! percentage saving first.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{Product, ProductId, Store, StoreQuote, round_to_unit};

/// Upper bound on the number of deals returned.
pub const MAX_DEALS: usize = 30;

/// Savings percentage at or above which a deal is "hot".
pub const HOT_THRESHOLD: u32 = 15;

/// Savings percentage at or above which a deal is "good".
pub const GOOD_THRESHOLD: u32 = 8;

/// How attractive a deal is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DealQuality {
    Hot,
    Good,
    #[default]
    Normal,
}

impl DealQuality {
    #[must_use]
    pub const fn from_savings_percent(percent: u32) -> Self {
        if percent >= HOT_THRESHOLD {
            Self::Hot
        } else if percent >= GOOD_THRESHOLD {
            Self::Good
        } else {
            Self::Normal
        }
    }
}

/// Optional filters for the deal finder.
///
/// A category of `"all"` (any case) or an empty string means no category
/// filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DealFilter {
    #[serde(deserialize_with = "deserialize_category")]
    pub category: Option<String>,
    pub max_price: Option<Decimal>,
}

fn deserialize_category<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|c| {
        let c = c.trim();
        if c.is_empty() || c.eq_ignore_ascii_case("all") {
            None
        } else {
            Some(c.to_string())
        }
    }))
}

impl DealFilter {
    fn admits(&self, product: &Product, quote: &StoreQuote) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|c| product.in_category(c));
        let price_ok = self.max_price.is_none_or(|max| quote.price <= max);
        category_ok && price_ok
    }
}

/// A discounted offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub product_id: ProductId,
    /// Product name with its unit, e.g. "Basmati Rice (5 kg)".
    pub product_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub original_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub deal_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub savings: Decimal,
    pub savings_percent: u32,
    pub store_name: String,
    pub store_logo: Option<String>,
    pub category: String,
    pub quality: DealQuality,
}

/// `round(savings / base * 100)`, or `None` when the quote saves nothing.
#[must_use]
pub fn savings_percent(base_price: Decimal, price: Decimal) -> Option<u32> {
    let savings = base_price - price;
    if savings <= Decimal::ZERO || base_price <= Decimal::ZERO {
        return None;
    }
    round_to_unit(savings / base_price * Decimal::ONE_HUNDRED).to_u32()
}

/// Find the best deals across `products`.
///
/// Only available quotes with a positive discount are considered. Quotes
/// from stores missing in `stores` are skipped. The result is sorted by
/// savings percentage (descending, ties in encounter order) and capped at
/// [`MAX_DEALS`].
#[must_use]
pub fn find_deals(products: &[Product], stores: &[Store], filter: &DealFilter) -> Vec<Deal> {
    let mut deals: Vec<Deal> = products
        .iter()
        .flat_map(|product| product.quotes.iter().map(move |quote| (product, quote)))
        .filter(|(_, quote)| quote.is_live_discount())
        .filter(|(product, quote)| filter.admits(product, quote))
        .filter_map(|(product, quote)| {
            let store = stores.iter().find(|s| s.id == quote.store_id)?;
            let percent = savings_percent(product.base_price, quote.price)?;
            Some(Deal {
                product_id: product.id,
                product_name: format!("{} ({})", product.name, product.unit),
                original_price: product.base_price,
                deal_price: quote.price,
                savings: product.base_price - quote.price,
                savings_percent: percent,
                store_name: store.name.clone(),
                store_logo: store.logo_url.clone(),
                category: product.category.clone(),
                quality: DealQuality::from_savings_percent(percent),
            })
        })
        .collect();

    deals.sort_by(|a, b| b.savings_percent.cmp(&a.savings_percent));
    deals.truncate(MAX_DEALS);
    deals
}
