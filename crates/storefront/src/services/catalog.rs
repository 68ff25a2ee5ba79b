//! Listing and filter services over a [`CatalogStore`].
//!
//! The listing serves fixed-size pages in a stable order plus a total count.
//! The filter serves every product matching a category set and/or a price
//! interval. A filter request that restricts nothing is answered with the
//! first listing page, so "no filter" means the same thing on both paths.
//!
//! Photos are cached in memory with `moka` (5-minute TTL, weighted by size).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument};

use dharma_core::api::ProductFilterRequest;
use dharma_core::{Category, FilterError, ProductFilter, ProductId, ProductSummary};

use crate::db::{CatalogStore, RepositoryError};
use crate::models::Photo;

/// Upper bound on cached photo bytes.
const PHOTO_CACHE_BYTES: u64 = 64 * 1024 * 1024;

/// Errors returned by the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Page numbers start at 1.
    #[error("page must be at least 1 (got {0})")]
    InvalidPage(u32),

    /// Filter body could not be turned into criteria.
    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    /// Requested product or photo does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The store failed.
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// Catalog read operations shared by all handlers.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    page_size: u32,
    photos: Cache<ProductId, Photo>,
}

impl CatalogService {
    /// Create a catalog service serving pages of `page_size` products.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, page_size: u32) -> Self {
        let photos = Cache::builder()
            .max_capacity(PHOTO_CACHE_BYTES)
            .weigher(|_id: &ProductId, photo: &Photo| {
                u32::try_from(photo.len()).unwrap_or(u32::MAX)
            })
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            store,
            page_size,
            photos,
        }
    }

    /// Fixed number of products per listing page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the store fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.store.list_categories().await?)
    }

    /// Page `page` (1-based) of the listing.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidPage` for page 0 and
    /// `CatalogError::Storage` if the store fails.
    #[instrument(skip(self))]
    pub async fn page(&self, page: u32) -> Result<Vec<ProductSummary>, CatalogError> {
        if page == 0 {
            return Err(CatalogError::InvalidPage(page));
        }
        let offset = u64::from(page - 1) * u64::from(self.page_size);
        let products = self.store.list_products(offset, self.page_size).await?;
        debug!(page, returned = products.len(), "Served listing page");
        Ok(products)
    }

    /// Number of products in the catalog, independent of pagination.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the store fails.
    #[instrument(skip(self))]
    pub async fn total_count(&self) -> Result<u64, CatalogError> {
        Ok(self.store.count_products().await?)
    }

    /// Products matching a filter request.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidFilter` for a malformed price pair and
    /// `CatalogError::Storage` if the store fails.
    #[instrument(skip(self, request), fields(checked = request.checked.len(), radio = request.radio.len()))]
    pub async fn filter(
        &self,
        request: ProductFilterRequest,
    ) -> Result<Vec<ProductSummary>, CatalogError> {
        let filter = ProductFilter::try_from(request)?;
        if filter.is_unrestricted() {
            debug!("Unrestricted filter, serving first listing page");
            return self.page(1).await;
        }
        let products = self.store.filter_products(&filter).await?;
        debug!(returned = products.len(), "Served filter result");
        Ok(products)
    }

    /// A single product by slug.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown slug and
    /// `CatalogError::Storage` if the store fails.
    #[instrument(skip(self))]
    pub async fn product(&self, slug: &str) -> Result<ProductSummary, CatalogError> {
        self.store
            .product_by_slug(slug)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("product {slug}")))
    }

    /// A product photo, served from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product has no photo and
    /// `CatalogError::Storage` if the store fails.
    #[instrument(skip(self))]
    pub async fn photo(&self, id: ProductId) -> Result<Photo, CatalogError> {
        if let Some(photo) = self.photos.get(&id).await {
            debug!("Cache hit for photo");
            return Ok(photo);
        }

        let photo = self
            .store
            .product_photo(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("photo for product {id}")))?;

        self.photos.insert(id, photo.clone()).await;
        Ok(photo)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use chrono::{Duration as ChronoDuration, Utc};

    use dharma_core::{CategoryId, Price, PriceRange};

    use super::*;
    use crate::db::MemoryCatalogStore;
    use crate::models::{NewCategory, NewProduct};

    /// 25 products across two categories, prices 4, 8, ..., 100.
    async fn catalog(page_size: u32) -> (CatalogService, Arc<MemoryCatalogStore>, CategoryId) {
        let store = Arc::new(MemoryCatalogStore::new());
        let electronics = store
            .insert_category(NewCategory {
                name: "Electronics".into(),
                slug: "electronics".into(),
            })
            .await
            .unwrap()
            .id;
        let hardware = store
            .insert_category(NewCategory {
                name: "Hardware".into(),
                slug: "hardware".into(),
            })
            .await
            .unwrap()
            .id;

        let base = Utc::now();
        for i in 0..25u32 {
            store
                .insert_product_at(
                    NewProduct {
                        name: format!("Product {i}"),
                        slug: format!("product-{i}"),
                        description: format!("Description {i}"),
                        price: Price::whole((i + 1) * 4),
                        category: if i % 2 == 0 { electronics } else { hardware },
                        photo: (i == 0).then(|| Photo::new("image/png", vec![1, 2, 3])),
                    },
                    base + ChronoDuration::seconds(i64::from(i)),
                )
                .await
                .unwrap();
        }

        let service = CatalogService::new(store.clone(), page_size);
        (service, store, electronics)
    }

    #[tokio::test]
    async fn test_pages_are_bounded_and_disjoint() {
        let (service, _, _) = catalog(10).await;
        let mut seen = HashSet::new();
        let mut sizes = Vec::new();

        for page in 1..=4 {
            let products = service.page(page).await.unwrap();
            assert!(products.len() <= 10);
            sizes.push(products.len());
            for product in products {
                assert!(seen.insert(product.id), "duplicate across pages");
            }
        }

        assert_eq!(sizes, [10, 10, 5, 0]);
        assert_eq!(seen.len(), 25);
    }

    #[tokio::test]
    async fn test_page_zero_rejected() {
        let (service, _, _) = catalog(10).await;
        assert!(matches!(
            service.page(0).await,
            Err(CatalogError::InvalidPage(0))
        ));
    }

    #[tokio::test]
    async fn test_total_count_bounds_filter_results() {
        let (service, _, electronics) = catalog(10).await;
        let total = service.total_count().await.unwrap();
        assert_eq!(total, 25);

        let everything_priced = service
            .filter(ProductFilterRequest {
                checked: vec![],
                radio: vec![Price::whole(0), Price::whole(9999)],
            })
            .await
            .unwrap();
        assert_eq!(everything_priced.len() as u64, total);

        let electronics_only = service
            .filter(ProductFilterRequest {
                checked: vec![electronics],
                radio: vec![],
            })
            .await
            .unwrap();
        assert_eq!(electronics_only.len(), 13);
        assert!(electronics_only.iter().all(|p| p.category == electronics));
    }

    #[tokio::test]
    async fn test_unrestricted_filter_is_first_page() {
        let (service, _, _) = catalog(10).await;
        let filtered = service
            .filter(ProductFilterRequest::default())
            .await
            .unwrap();
        assert_eq!(filtered, service.page(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_filter_is_deterministic() {
        let (service, _, electronics) = catalog(10).await;
        let bounds = PriceRange::by_id(1).unwrap().bounds();
        let request = ProductFilterRequest {
            checked: vec![electronics],
            radio: vec![bounds.low(), bounds.high()],
        };

        let first = service.filter(request.clone()).await.unwrap();
        let second = service.filter(request).await.unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[tokio::test]
    async fn test_bad_radio_is_invalid_filter() {
        let (service, _, _) = catalog(10).await;
        let result = service
            .filter(ProductFilterRequest {
                checked: vec![],
                radio: vec![Price::whole(1), Price::whole(2), Price::whole(3)],
            })
            .await;
        assert!(matches!(result, Err(CatalogError::InvalidFilter(_))));
    }

    #[tokio::test]
    async fn test_photo_cached_after_first_read() {
        let (service, store, _) = catalog(10).await;
        let id = store.product_by_slug("product-0").await.unwrap().unwrap().id;

        let photo = service.photo(id).await.unwrap();
        assert_eq!(photo.content_type, "image/png");

        store.set_unavailable(true);
        assert_eq!(service.photo(id).await.unwrap(), photo);
    }

    #[tokio::test]
    async fn test_missing_photo_not_found() {
        let (service, store, _) = catalog(10).await;
        let id = store.product_by_slug("product-1").await.unwrap().unwrap().id;
        assert!(matches!(
            service.photo(id).await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let (service, store, _) = catalog(10).await;
        store.set_unavailable(true);
        assert!(matches!(
            service.page(1).await,
            Err(CatalogError::Storage(RepositoryError::Unavailable(_)))
        ));
    }
}
