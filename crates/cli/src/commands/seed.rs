//! Seed the catalog database from a YAML file.
//!
//! The file lists stores, then products with their per-store quotes. Quotes
//! reference stores by name. Everything is validated before connecting, and
//! the whole load runs in one transaction.
//!
//! ```yaml
//! stores:
//!   - name: FreshMart
//!     rating: 4.3
//!     deliveryFee: 25
//!     minOrder: 199
//! products:
//!   - name: Toned Milk
//!     category: Dairy
//!     unit: 1 L
//!     basePrice: 68
//!     prices:
//!       - store: FreshMart
//!         price: 64
//!         discountPercent: 5
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use basketwise_storefront::db;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use tracing::{error, info};

use super::{DATABASE_URL_VAR, database_url};

/// A catalog file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFile {
    #[serde(default)]
    pub stores: Vec<SeedStore>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedStore {
    pub name: String,
    pub logo_url: Option<String>,
    #[serde(default)]
    pub rating: Decimal,
    #[serde(default)]
    pub delivery_fee: Decimal,
    #[serde(default)]
    pub min_order: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedProduct {
    pub name: String,
    pub category: String,
    pub unit: String,
    pub base_price: Decimal,
    pub image_url: Option<String>,
    #[serde(default)]
    pub prices: Vec<SeedQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedQuote {
    pub store: String,
    pub price: Decimal,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub discount_percent: Decimal,
}

const fn default_available() -> bool {
    true
}

/// Counts of rows written.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub stores: usize,
    pub products: usize,
    pub quotes: usize,
}

/// Check a catalog for problems the database would reject, plus dangling
/// store references. Returns every problem found.
pub fn validate(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut store_names = HashSet::new();

    for store in &catalog.stores {
        if store.name.trim().is_empty() {
            errors.push("store with empty name".to_string());
        }
        if !store_names.insert(store.name.as_str()) {
            errors.push(format!("duplicate store: {}", store.name));
        }
        if store.rating < Decimal::ZERO || store.rating > Decimal::from(5) {
            errors.push(format!("{}: rating must be between 0 and 5", store.name));
        }
        if store.delivery_fee.is_sign_negative() || store.min_order.is_sign_negative() {
            errors.push(format!("{}: fees must not be negative", store.name));
        }
    }

    let mut product_keys = HashSet::new();
    for product in &catalog.products {
        let label = format!("{} ({})", product.name, product.unit);
        if product.name.trim().is_empty() || product.unit.trim().is_empty() {
            errors.push(format!("{label}: name and unit are required"));
        }
        if !product_keys.insert((product.name.as_str(), product.unit.as_str())) {
            errors.push(format!("duplicate product: {label}"));
        }
        if product.base_price.is_sign_negative() {
            errors.push(format!("{label}: base price must not be negative"));
        }

        let mut quoted = HashSet::new();
        for quote in &product.prices {
            if !store_names.contains(quote.store.as_str()) {
                errors.push(format!("{label}: unknown store {}", quote.store));
            }
            if !quoted.insert(quote.store.as_str()) {
                errors.push(format!("{label}: more than one price for {}", quote.store));
            }
            if quote.price.is_sign_negative() {
                errors.push(format!("{label}: negative price at {}", quote.store));
            }
            if quote.discount_percent < Decimal::ZERO
                || quote.discount_percent > Decimal::ONE_HUNDRED
            {
                errors.push(format!(
                    "{label}: discount at {} must be between 0 and 100",
                    quote.store
                ));
            }
        }
    }

    errors
}

/// Seed the catalog from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the catalog YAML file
/// * `clear_existing` - If true, delete all stores, products and prices first
///
/// # Errors
///
/// Returns an error if the database URL is missing, the file cannot be read
/// or fails validation, or a database operation fails.
pub async fn catalog(
    file_path: &Path,
    clear_existing: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = database_url().ok_or_else(|| format!("{DATABASE_URL_VAR} not set"))?;

    info!(path = %file_path.display(), "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(file_path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    info!(
        stores = catalog.stores.len(),
        products = catalog.products.len(),
        "Parsed catalog"
    );

    let errors = validate(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&url).await?;
    info!("Connected to database");

    let mut tx = pool.begin().await?;
    if clear_existing {
        clear(&mut tx).await?;
        info!("Existing catalog cleared");
    }
    let summary = insert(&mut tx, &catalog).await?;
    tx.commit().await?;

    info!("Seeding complete!");
    info!("  Stores upserted: {}", summary.stores);
    info!("  Products upserted: {}", summary.products);
    info!("  Prices upserted: {}", summary.quotes);

    Ok(())
}

async fn clear(tx: &mut Transaction<'_, Postgres>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "TRUNCATE catalog.product_prices, catalog.products, catalog.stores RESTART IDENTITY",
    )
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    catalog: &CatalogFile,
) -> Result<SeedSummary, sqlx::Error> {
    let conn = &mut **tx;
    let mut summary = SeedSummary::default();
    let mut store_ids = HashMap::new();

    for store in &catalog.stores {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO catalog.stores (name, logo_url, rating, delivery_fee, min_order)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO UPDATE SET
                logo_url = EXCLUDED.logo_url,
                rating = EXCLUDED.rating,
                delivery_fee = EXCLUDED.delivery_fee,
                min_order = EXCLUDED.min_order
            RETURNING id
            ",
        )
        .bind(&store.name)
        .bind(&store.logo_url)
        .bind(store.rating)
        .bind(store.delivery_fee)
        .bind(store.min_order)
        .fetch_one(&mut *conn)
        .await?;
        store_ids.insert(store.name.as_str(), id);
        summary.stores += 1;
    }

    for product in &catalog.products {
        let product_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO catalog.products (name, category, unit, base_price, image_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name, unit) DO UPDATE SET
                category = EXCLUDED.category,
                base_price = EXCLUDED.base_price,
                image_url = EXCLUDED.image_url
            RETURNING id
            ",
        )
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.unit)
        .bind(product.base_price)
        .bind(&product.image_url)
        .fetch_one(&mut *conn)
        .await?;
        summary.products += 1;

        for quote in &product.prices {
            // Validation guarantees the store exists
            let Some(&store_id) = store_ids.get(quote.store.as_str()) else {
                continue;
            };
            sqlx::query(
                r"
                INSERT INTO catalog.product_prices
                    (product_id, store_id, price, is_available, discount_percent, updated_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                ON CONFLICT (product_id, store_id) DO UPDATE SET
                    price = EXCLUDED.price,
                    is_available = EXCLUDED.is_available,
                    discount_percent = EXCLUDED.discount_percent,
                    updated_at = NOW()
                ",
            )
            .bind(product_id)
            .bind(store_id)
            .bind(quote.price)
            .bind(quote.available)
            .bind(quote.discount_percent)
            .execute(&mut *conn)
            .await?;
            summary.quotes += 1;
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
stores:
  - name: FreshMart
    rating: 4.3
    deliveryFee: 25
    minOrder: 199
  - name: QuickBasket
    rating: 4.0
products:
  - name: Toned Milk
    category: Dairy
    unit: 1 L
    basePrice: 68
    prices:
      - store: FreshMart
        price: 64
        discountPercent: 5
      - store: QuickBasket
        price: 66
        available: false
";

    #[test]
    fn test_parse_sample() {
        let catalog: CatalogFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(catalog.stores.len(), 2);
        assert_eq!(catalog.stores[1].delivery_fee, Decimal::ZERO);
        let quotes = &catalog.products[0].prices;
        assert!(quotes[0].available);
        assert!(!quotes[1].available);
        assert_eq!(quotes[0].discount_percent, Decimal::from(5));
        assert!(validate(&catalog).is_empty());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let catalog: CatalogFile = serde_yaml::from_str(
            r"
stores:
  - name: FreshMart
    rating: 6
  - name: FreshMart
products:
  - name: Eggs
    category: Dairy
    unit: 6 pcs
    basePrice: 42
    prices:
      - store: Nowhere
        price: -1
        discountPercent: 120
",
        )
        .unwrap();
        let errors = validate(&catalog);
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("duplicate store")));
        assert!(errors.iter().any(|e| e.contains("unknown store Nowhere")));
    }

    #[test]
    fn test_validate_duplicate_product_and_quote() {
        let catalog: CatalogFile = serde_yaml::from_str(
            r"
stores:
  - name: FreshMart
products:
  - name: Bread
    category: Bakery
    unit: 400 g
    basePrice: 45
    prices:
      - store: FreshMart
        price: 40
      - store: FreshMart
        price: 41
  - name: Bread
    category: Bakery
    unit: 400 g
    basePrice: 45
",
        )
        .unwrap();
        let errors = validate(&catalog);
        assert_eq!(errors.len(), 2, "{errors:?}");
    }
}
