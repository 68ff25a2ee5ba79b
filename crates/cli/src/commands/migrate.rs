//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! dharma migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! Migration files live in `crates/storefront/migrations/` and are embedded
//! into the binary at build time.

use secrecy::SecretString;
use tracing::info;

use dharma_storefront::{MIGRATOR, db};

/// Errors running migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Read the storefront database URL from the environment.
///
/// # Errors
///
/// Returns `MigrationError::MissingEnvVar` if neither variable is set.
pub fn database_url() -> Result<SecretString, MigrationError> {
    dotenvy::dotenv().ok();

    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the URL is missing, the database is unreachable, or a
/// migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    let database_url = database_url()?;

    info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    info!(
        migrations = MIGRATOR.iter().count(),
        "Running storefront migrations..."
    );
    MIGRATOR.run(&pool).await?;

    info!("Storefront migrations complete!");
    Ok(())
}
