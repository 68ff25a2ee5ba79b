//! Catalog storage for the storefront.
//!
//! # Database: `dharma_storefront`
//!
//! ## Tables (schema `catalog`)
//!
//! - `category` - Product categories
//! - `product` - Product metadata
//! - `product_photo` - Photo payloads, kept apart so listings never load them
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p dharma-cli -- migrate
//! ```
//!
//! # Stores
//!
//! Handlers talk to a [`CatalogStore`]. [`PgCatalogStore`] is the production
//! implementation; [`MemoryCatalogStore`] backs tests and local demos.

pub mod catalog;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use dharma_core::{Category, ProductFilter, ProductId, ProductSummary};

use crate::models::{NewCategory, NewProduct, Photo};

pub use catalog::PgCatalogStore;
pub use memory::MemoryCatalogStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backing store cannot serve requests right now.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Read access to the catalog, plus the inserts used for seeding.
///
/// Every product list is ordered newest first (`created_at DESC, id DESC`),
/// so page boundaries are stable between calls.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All categories, ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    /// Up to `limit` products starting `offset` rows into the listing order.
    async fn list_products(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ProductSummary>, RepositoryError>;

    /// Number of products in the store.
    async fn count_products(&self) -> Result<u64, RepositoryError>;

    /// Every product matching `filter`, unpaginated.
    async fn filter_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductSummary>, RepositoryError>;

    /// A product by its slug.
    async fn product_by_slug(&self, slug: &str) -> Result<Option<ProductSummary>, RepositoryError>;

    /// The photo of a product, if it exists and has one.
    async fn product_photo(&self, id: ProductId) -> Result<Option<Photo>, RepositoryError>;

    /// Insert a category.
    async fn insert_category(&self, category: NewCategory) -> Result<Category, RepositoryError>;

    /// Insert a product together with its photo.
    async fn insert_product(&self, product: NewProduct) -> Result<ProductSummary, RepositoryError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

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
