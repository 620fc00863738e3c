//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! bw-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Catalog migrations live in `crates/storefront/migrations/` and are embedded
//! into the binary at compile time.

use basketwise_storefront::db;
use thiserror::Error;
use tracing::info;

use super::{DATABASE_URL_VAR, database_url};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run catalog database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing, the connection
/// fails, or a migration fails to apply.
pub async fn catalog() -> Result<(), MigrationError> {
    let url = database_url().ok_or(MigrationError::MissingEnvVar(DATABASE_URL_VAR))?;

    info!("Connecting to catalog database...");
    let pool = db::create_pool(&url).await?;

    info!("Running catalog migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    info!("Catalog migrations complete!");
    Ok(())
}
