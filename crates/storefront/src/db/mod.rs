//! Database operations for storefront `PostgreSQL`.
//!
//! # Schema: `catalog`
//!
//! ## Tables
//!
//! - `stores` - Grocery stores with rating, delivery fee and minimum order
//! - `products` - Products with category, unit and MRP
//! - `product_prices` - One quote per (product, store): price, availability, discount
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p basketwise-cli -- migrate
//! ```

pub mod prices;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use prices::PgPriceSource;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
