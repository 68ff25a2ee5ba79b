//! In-memory catalog store.
//!
//! Mirrors the `PostgreSQL` store's ordering and filtering rules exactly so
//! route and service tests exercise the same semantics without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use dharma_core::{Category, CategoryId, ProductFilter, ProductId, ProductSummary};

use super::{CatalogStore, RepositoryError};
use crate::models::{NewCategory, NewProduct, Photo};

#[derive(Default)]
struct Inner {
    categories: Vec<Category>,
    products: Vec<ProductSummary>,
    photos: HashMap<ProductId, Photo>,
}

impl Inner {
    /// Products in listing order: newest first, id descending on ties.
    fn ordered(&self) -> Vec<&ProductSummary> {
        let mut products: Vec<_> = self.products.iter().collect();
        products.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        products
    }
}

/// Catalog store held entirely in memory.
#[derive(Default)]
pub struct MemoryCatalogStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl MemoryCatalogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a product with an explicit creation time.
    ///
    /// Tests use this to pin the listing order.
    pub async fn insert_product_at(
        &self,
        product: NewProduct,
        created_at: DateTime<Utc>,
    ) -> Result<ProductSummary, RepositoryError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;

        if inner.products.iter().any(|p| p.slug == product.slug) {
            return Err(RepositoryError::Conflict(
                "product slug already exists".to_owned(),
            ));
        }
        if !inner.categories.iter().any(|c| c.id == product.category) {
            return Err(RepositoryError::Conflict(format!(
                "unknown category {}",
                product.category
            )));
        }

        let summary = ProductSummary {
            id: ProductId::random(),
            name: product.name,
            slug: product.slug,
            description: product.description,
            price: product.price,
            category: product.category,
            created_at,
        };
        if let Some(photo) = product.photo {
            inner.photos.insert(summary.id, photo);
        }
        inner.products.push(summary.clone());
        Ok(summary)
    }

    /// Make every subsequent call fail with `RepositoryError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "in-memory store switched off".to_owned(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        self.check_available()?;
        let mut categories = self.inner.read().await.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn list_products(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        self.check_available()?;
        let inner = self.inner.read().await;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(inner
            .ordered()
            .into_iter()
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn count_products(&self) -> Result<u64, RepositoryError> {
        self.check_available()?;
        let len = self.inner.read().await.products.len();
        u64::try_from(len).map_err(|_| RepositoryError::DataCorruption("count overflow".into()))
    }

    async fn filter_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        self.check_available()?;
        let inner = self.inner.read().await;
        Ok(inner
            .ordered()
            .into_iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<ProductSummary>, RepositoryError> {
        self.check_available()?;
        let inner = self.inner.read().await;
        Ok(inner.products.iter().find(|p| p.slug == slug).cloned())
    }

    async fn product_photo(&self, id: ProductId) -> Result<Option<Photo>, RepositoryError> {
        self.check_available()?;
        Ok(self.inner.read().await.photos.get(&id).cloned())
    }

    async fn insert_category(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        if inner.categories.iter().any(|c| c.slug == category.slug) {
            return Err(RepositoryError::Conflict(
                "category slug already exists".to_owned(),
            ));
        }
        let created = Category {
            id: CategoryId::random(),
            name: category.name,
            slug: category.slug,
        };
        inner.categories.push(created.clone());
        Ok(created)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<ProductSummary, RepositoryError> {
        self.insert_product_at(product, Utc::now()).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check_available()
    }
}
