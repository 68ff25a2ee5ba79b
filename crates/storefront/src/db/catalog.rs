//! `PostgreSQL` catalog repository.
//!
//! Queries are built at runtime (`query_as` + `FromRow`) so the crate builds
//! without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use dharma_core::{Category, CategoryId, Price, ProductFilter, ProductId, ProductSummary};

use super::{CatalogStore, RepositoryError};
use crate::models::{NewCategory, NewProduct, Photo};

const PRODUCT_COLUMNS: &str =
    "id, name, slug, description, price, category_id, created_at";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    slug: String,
    description: String,
    price: Decimal,
    category_id: CategoryId,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for ProductSummary {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price,
            category: row.category_id,
            created_at: row.created_at,
        })
    }
}

fn into_summaries(rows: Vec<ProductRow>) -> Result<Vec<ProductSummary>, RepositoryError> {
    rows.into_iter().map(ProductSummary::try_from).collect()
}

fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} slug already exists"));
    }
    RepositoryError::Database(e)
}

/// Catalog store backed by the `catalog` schema.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Create a new catalog store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            r"
            SELECT id, name, slug
            FROM catalog.category
            ORDER BY name, id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_products(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        let offset = i64::try_from(offset)
            .map_err(|_| RepositoryError::DataCorruption(format!("offset {offset} too large")))?;

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM catalog.product
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "
        ))
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        debug!(rows = rows.len(), "Fetched product page");
        into_summaries(rows)
    }

    #[instrument(skip(self))]
    async fn count_products(&self) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM catalog.product")
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count {count}")))
    }

    #[instrument(skip(self), fields(categories = filter.categories.len(), priced = filter.price.is_some()))]
    async fn filter_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        let (low, high) = filter
            .price
            .map(|bounds| (bounds.low().amount(), bounds.high().amount()))
            .unzip();

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM catalog.product
            WHERE (cardinality($1::uuid[]) = 0 OR category_id = ANY($1))
              AND ($2::numeric IS NULL OR price BETWEEN $2 AND $3)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(&filter.categories)
        .bind(low)
        .bind(high)
        .fetch_all(&self.pool)
        .await?;

        debug!(rows = rows.len(), "Filtered products");
        into_summaries(rows)
    }

    #[instrument(skip(self))]
    async fn product_by_slug(&self, slug: &str) -> Result<Option<ProductSummary>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM catalog.product
            WHERE slug = $1
            "
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductSummary::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn product_photo(&self, id: ProductId) -> Result<Option<Photo>, RepositoryError> {
        let row: Option<(String, Vec<u8>)> = sqlx::query_as(
            r"
            SELECT content_type, data
            FROM catalog.product_photo
            WHERE product_id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(content_type, data)| Photo::new(content_type, data)))
    }

    #[instrument(skip(self, category), fields(slug = %category.slug))]
    async fn insert_category(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        let row: CategoryRow = sqlx::query_as(
            r"
            INSERT INTO catalog.category (id, name, slug)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug
            ",
        )
        .bind(CategoryId::random())
        .bind(&category.name)
        .bind(&category.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "category"))?;

        Ok(row.into())
    }

    #[instrument(skip(self, product), fields(slug = %product.slug))]
    async fn insert_product(&self, product: NewProduct) -> Result<ProductSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: ProductRow = sqlx::query_as(&format!(
            r"
            INSERT INTO catalog.product (id, name, slug, description, price, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(ProductId::random())
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.category)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "product"))?;

        if let Some(photo) = &product.photo {
            sqlx::query(
                r"
                INSERT INTO catalog.product_photo (product_id, content_type, data)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(row.id)
            .bind(&photo.content_type)
            .bind(photo.data.as_ref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        ProductSummary::try_from(row)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
