//! Best-store comparison for a cart.
//!
//! For every store the cart is priced using that store's quotes. Lines the
//! store cannot supply (no quote, or a quote marked unavailable) are listed
//! by product name and left out of the total. Stores that can supply the
//! whole cart rank first; within each group the cheaper total wins, and
//! equal totals keep their input order.
//!
//! Nothing here fails: a missing quote is unavailability, not an error.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{CartLine, Store, StoreId, round_to_unit};

/// What a cart would cost at one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAnalysis {
    pub store_id: StoreId,
    pub store_name: String,
    /// Sum of price × quantity over the lines this store has available.
    pub total: Decimal,
    /// Number of cart lines this store has available.
    pub available_count: usize,
    /// Names of products the store cannot supply, in cart order.
    pub unavailable_items: Vec<String>,
}

impl StoreAnalysis {
    /// Every cart line has an available quote at this store.
    #[must_use]
    pub fn is_fully_available(&self) -> bool {
        self.unavailable_items.is_empty()
    }
}

/// Ranked stores plus the savings figure shown next to the best one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub stores: Vec<StoreAnalysis>,
    pub savings: Option<Decimal>,
}

impl Comparison {
    /// The first-ranked store.
    #[must_use]
    pub fn best_store(&self) -> Option<&StoreAnalysis> {
        best_store(&self.stores)
    }
}

/// Price `cart` at a single store.
#[must_use]
pub fn analyze_store(cart: &[CartLine<'_>], store: &Store) -> StoreAnalysis {
    let mut total = Decimal::ZERO;
    let mut available_count = 0;
    let mut unavailable_items = Vec::new();

    for line in cart {
        match line.product.quote_for(store.id) {
            Some(quote) if quote.available => {
                total += quote.price * Decimal::from(line.quantity.get());
                available_count += 1;
            }
            _ => unavailable_items.push(line.product.name.clone()),
        }
    }

    StoreAnalysis {
        store_id: store.id,
        store_name: store.name.clone(),
        total,
        available_count,
        unavailable_items,
    }
}

/// Analyze every store and rank them. Empty cart or no stores gives an
/// empty ranking.
#[must_use]
pub fn rank_stores(cart: &[CartLine<'_>], stores: &[Store]) -> Vec<StoreAnalysis> {
    if cart.is_empty() || stores.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<StoreAnalysis> = stores.iter().map(|s| analyze_store(cart, s)).collect();
    // `sort_by` is stable, so equal keys keep input order.
    ranked.sort_by(ranking_order);
    ranked
}

fn ranking_order(a: &StoreAnalysis, b: &StoreAnalysis) -> Ordering {
    b.is_fully_available()
        .cmp(&a.is_fully_available())
        .then_with(|| a.total.cmp(&b.total))
}

/// First element of a ranking.
#[must_use]
pub fn best_store(ranked: &[StoreAnalysis]) -> Option<&StoreAnalysis> {
    ranked.first()
}

/// Cart priced at each product's highest quote across all stores.
///
/// Products nobody quotes contribute nothing.
#[must_use]
pub fn mrp_total(cart: &[CartLine<'_>]) -> Decimal {
    cart.iter()
        .filter_map(|line| {
            line.product
                .price_range()
                .map(|range| range.max * Decimal::from(line.quantity.get()))
        })
        .sum()
}

/// Savings shown to the user: `round(mrp_total) - round(best.total)`.
///
/// Both sides are rounded to whole units before subtracting, which can
/// differ by one unit from rounding the difference.
#[must_use]
pub fn displayed_savings(cart: &[CartLine<'_>], ranked: &[StoreAnalysis]) -> Option<Decimal> {
    let best = best_store(ranked)?;
    Some(round_to_unit(mrp_total(cart)) - round_to_unit(best.total))
}

/// Rank stores for `cart` and compute the savings figure.
#[must_use]
pub fn compare(cart: &[CartLine<'_>], stores: &[Store]) -> Comparison {
    let ranked = rank_stores(cart, stores);
    let savings = displayed_savings(cart, &ranked);
    Comparison {
        stores: ranked,
        savings,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::{Product, ProductId, Quantity, StoreQuote};

    fn store(id: i32, name: &str) -> Store {
        Store {
            id: StoreId::new(id),
            name: name.to_string(),
            logo_url: None,
            rating: Decimal::new(45, 1),
            delivery_fee: Decimal::ZERO,
            min_order: Decimal::ZERO,
        }
    }

    fn quote(product: i32, store: i32, price: Decimal, available: bool) -> StoreQuote {
        StoreQuote {
            product_id: ProductId::new(product),
            store_id: StoreId::new(store),
            price,
            available,
            discount_percent: Decimal::ZERO,
            updated_at: None,
        }
    }

    fn product(id: i32, name: &str, quotes: Vec<StoreQuote>) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            category: "staples".to_string(),
            unit: "1 kg".to_string(),
            base_price: Decimal::from(100),
            image_url: None,
            quotes,
        }
    }

    fn line(product: &Product, qty: u32) -> CartLine<'_> {
        CartLine {
            product,
            quantity: Quantity::new(qty).unwrap(),
        }
    }

    #[test]
    fn test_cheaper_store_ranks_first() {
        let a = product(
            1,
            "A",
            vec![
                quote(1, 1, Decimal::from(50), true),
                quote(1, 2, Decimal::from(45), true),
            ],
        );
        let stores = vec![store(1, "X"), store(2, "Y")];
        let cart = vec![line(&a, 2)];

        let ranked = rank_stores(&cart, &stores);
        assert_eq!(ranked[0].store_name, "Y");
        assert_eq!(ranked[0].total, Decimal::from(90));
        assert_eq!(ranked[1].store_name, "X");
        assert_eq!(ranked[1].total, Decimal::from(100));
    }

    #[test]
    fn test_missing_quote_is_unavailable() {
        let a = product(1, "A", vec![quote(1, 1, Decimal::from(20), true)]);
        let stores = vec![store(2, "Y"), store(1, "X")];
        let cart = vec![line(&a, 1)];

        let ranked = rank_stores(&cart, &stores);
        assert_eq!(ranked[0].store_name, "X");
        assert!(ranked[0].is_fully_available());

        let y = &ranked[1];
        assert_eq!(y.store_name, "Y");
        assert!(!y.is_fully_available());
        assert_eq!(y.unavailable_items, vec!["A".to_string()]);
        assert_eq!(y.total, Decimal::ZERO);
        assert_eq!(y.available_count, 0);
    }

    #[test]
    fn test_unavailable_quote_excluded_from_total() {
        let a = product(1, "A", vec![quote(1, 1, Decimal::from(30), true)]);
        let b = product(2, "B", vec![quote(2, 1, Decimal::from(99), false)]);
        let cart = vec![line(&a, 2), line(&b, 5)];

        let analysis = analyze_store(&cart, &store(1, "X"));
        assert_eq!(analysis.total, Decimal::from(60));
        assert_eq!(analysis.available_count, 1);
        assert_eq!(analysis.unavailable_items, vec!["B".to_string()]);
    }

    #[test]
    fn test_partial_store_ranks_after_full_even_if_cheaper() {
        let a = product(
            1,
            "A",
            vec![
                quote(1, 1, Decimal::from(10), true),
                quote(1, 2, Decimal::from(80), true),
            ],
        );
        let b = product(2, "B", vec![quote(2, 2, Decimal::from(5), true)]);
        let stores = vec![store(1, "Cheap"), store(2, "Complete")];
        let cart = vec![line(&a, 1), line(&b, 1)];

        let ranked = rank_stores(&cart, &stores);
        assert_eq!(ranked[0].store_name, "Complete");
        assert_eq!(ranked[1].store_name, "Cheap");
    }

    #[test]
    fn test_equal_totals_keep_input_order() {
        let a = product(
            1,
            "A",
            vec![
                quote(1, 1, Decimal::from(40), true),
                quote(1, 2, Decimal::from(40), true),
                quote(1, 3, Decimal::from(40), true),
            ],
        );
        let stores = vec![store(3, "Third"), store(1, "First"), store(2, "Second")];
        let cart = vec![line(&a, 1)];

        let names: Vec<_> = rank_stores(&cart, &stores)
            .into_iter()
            .map(|s| s.store_name)
            .collect();
        assert_eq!(names, vec!["Third", "First", "Second"]);
    }

    #[test]
    fn test_every_store_appears_once() {
        let a = product(1, "A", vec![quote(1, 1, Decimal::from(10), true)]);
        let stores = vec![store(1, "X"), store(2, "Y"), store(3, "Z")];
        let cart = vec![line(&a, 3)];

        assert_eq!(rank_stores(&cart, &stores).len(), stores.len());
    }

    #[test]
    fn test_full_store_total_is_exact_sum() {
        let a = product(1, "A", vec![quote(1, 1, Decimal::new(12_75, 2), true)]);
        let b = product(2, "B", vec![quote(2, 1, Decimal::new(3_10, 2), true)]);
        let cart = vec![line(&a, 3), line(&b, 7)];

        let analysis = analyze_store(&cart, &store(1, "X"));
        assert!(analysis.is_fully_available());
        // 12.75 * 3 + 3.10 * 7
        assert_eq!(analysis.total, Decimal::new(59_95, 2));
    }

    #[test]
    fn test_empty_inputs_produce_empty_ranking() {
        let a = product(1, "A", vec![quote(1, 1, Decimal::from(10), true)]);
        assert!(rank_stores(&[], &[store(1, "X")]).is_empty());
        assert!(rank_stores(&[line(&a, 1)], &[]).is_empty());

        let comparison = compare(&[], &[store(1, "X")]);
        assert!(comparison.best_store().is_none());
        assert!(comparison.savings.is_none());
    }

    #[test]
    fn test_mrp_total_uses_highest_quote() {
        let a = product(
            1,
            "A",
            vec![
                quote(1, 1, Decimal::from(50), true),
                quote(1, 2, Decimal::from(45), false),
                quote(1, 3, Decimal::from(62), true),
            ],
        );
        let unquoted = product(2, "B", vec![]);
        let cart = vec![line(&a, 2), line(&unquoted, 4)];

        assert_eq!(mrp_total(&cart), Decimal::from(124));
    }

    #[test]
    fn test_savings_round_each_side_before_subtracting() {
        // 10.50 rounds to 11 and 9.40 to 9, so the figure is 2 where
        // round(10.50 - 9.40) would give 1.
        let a = product(
            1,
            "A",
            vec![
                quote(1, 1, Decimal::new(10_50, 2), true),
                quote(1, 2, Decimal::new(9_40, 2), true),
            ],
        );
        let stores = vec![store(1, "X"), store(2, "Y")];
        let cart = vec![line(&a, 1)];

        let comparison = compare(&cart, &stores);
        assert_eq!(comparison.best_store().unwrap().store_name, "Y");
        assert_eq!(comparison.savings, Some(Decimal::from(2)));
    }
}
