//! Seed the catalog from a YAML file.
//!
//! # File Format
//!
//! ```yaml
//! categories:
//!   - name: Electronics
//!     slug: electronics
//! products:
//!   - name: Digital Multimeter
//!     slug: digital-multimeter
//!     description: Auto-ranging, true RMS.
//!     price: 49.99
//!     category: electronics        # category slug
//!     photo: photos/multimeter.jpg # relative to the YAML file, optional
//! ```
//!
//! Categories whose slug already exists are reused; products whose slug
//! already exists are skipped.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{error, info, warn};

use dharma_core::{CategoryId, Price};
use dharma_storefront::db::{self, CatalogStore, PgCatalogStore, RepositoryError};
use dharma_storefront::models::{NewCategory, NewProduct, Photo};

use super::migrate::database_url;

/// Top-level seed document.
#[derive(Debug, Deserialize)]
pub struct SeedCatalog {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    /// Category slug.
    pub category: String,
    pub photo: Option<PathBuf>,
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub categories_inserted: usize,
    pub categories_reused: usize,
    pub products_inserted: usize,
    pub products_skipped: usize,
}

/// Check a seed document for problems that would fail half-way through.
#[must_use]
pub fn validate(catalog: &SeedCatalog) -> Vec<String> {
    let mut errors = Vec::new();

    let mut category_slugs = HashSet::new();
    for category in &catalog.categories {
        if !category_slugs.insert(category.slug.as_str()) {
            errors.push(format!("duplicate category slug '{}'", category.slug));
        }
    }

    let mut product_slugs = HashSet::new();
    for product in &catalog.products {
        if !product_slugs.insert(product.slug.as_str()) {
            errors.push(format!("duplicate product slug '{}'", product.slug));
        }
        if !category_slugs.contains(product.category.as_str()) {
            errors.push(format!(
                "product '{}' references unknown category '{}'",
                product.slug, product.category
            ));
        }
    }

    errors
}

/// MIME type for a photo path, from its extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Insert a parsed catalog into `store`.
///
/// Photo paths are resolved relative to `base_dir`.
///
/// # Errors
///
/// Returns an error if a photo cannot be read or the store fails for a reason
/// other than a duplicate slug.
pub async fn seed_catalog(
    store: &dyn CatalogStore,
    catalog: SeedCatalog,
    base_dir: &Path,
) -> Result<SeedResult, Box<dyn std::error::Error>> {
    let mut result = SeedResult::default();

    let mut category_ids: HashMap<String, CategoryId> = store
        .list_categories()
        .await?
        .into_iter()
        .map(|c| (c.slug, c.id))
        .collect();

    for category in catalog.categories {
        if category_ids.contains_key(&category.slug) {
            result.categories_reused += 1;
            continue;
        }
        let created = store
            .insert_category(NewCategory {
                name: category.name,
                slug: category.slug,
            })
            .await?;
        category_ids.insert(created.slug, created.id);
        result.categories_inserted += 1;
    }

    for product in catalog.products {
        let category = *category_ids
            .get(&product.category)
            .ok_or_else(|| format!("unknown category '{}'", product.category))?;

        let photo = match &product.photo {
            Some(relative) => {
                let path = base_dir.join(relative);
                let data = tokio::fs::read(&path)
                    .await
                    .map_err(|e| format!("reading {}: {e}", path.display()))?;
                Some(Photo::new(content_type_for(&path), data))
            }
            None => None,
        };

        let slug = product.slug.clone();
        match store
            .insert_product(NewProduct {
                name: product.name,
                slug: product.slug,
                description: product.description,
                price: product.price,
                category,
                photo,
            })
            .await
        {
            Ok(_) => result.products_inserted += 1,
            Err(RepositoryError::Conflict(reason)) => {
                warn!(slug = %slug, reason = %reason, "Skipping existing product");
                result.products_skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(result)
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if environment variables are missing, the file cannot be
/// read or fails validation, or database operations fail.
pub async fn catalog(file_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url()?;

    if !file_path.exists() {
        return Err(format!("File not found: {}", file_path.display()).into());
    }

    info!(path = %file_path.display(), "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(file_path).await?;
    let catalog: SeedCatalog = serde_yaml::from_str(&content)?;

    info!(
        categories = catalog.categories.len(),
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

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let store = PgCatalogStore::new(pool);
    let base_dir = file_path.parent().unwrap_or_else(|| Path::new("."));
    let result = seed_catalog(&store, catalog, base_dir).await?;

    info!("Seeding complete!");
    info!("  Categories inserted: {}", result.categories_inserted);
    info!("  Categories reused: {}", result.categories_reused);
    info!("  Products inserted: {}", result.products_inserted);
    info!("  Products skipped (already exist): {}", result.products_skipped);

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dharma_storefront::db::MemoryCatalogStore;

    use super::*;

    const CATALOG: &str = r"
categories:
  - name: Electronics
    slug: electronics
  - name: Hardware
    slug: hardware
products:
  - name: Digital Multimeter
    slug: digital-multimeter
    description: Auto-ranging, true RMS.
    price: 49.99
    category: electronics
    photo: multimeter.png
  - name: Claw Hammer
    slug: claw-hammer
    price: 12
    category: hardware
";

    #[test]
    fn test_parse_and_validate() {
        let catalog: SeedCatalog = serde_yaml::from_str(CATALOG).unwrap();
        assert_eq!(catalog.categories.len(), 2);
        assert_eq!(catalog.products.len(), 2);
        assert!(catalog.products.last().unwrap().description.is_empty());
        assert!(validate(&catalog).is_empty());
    }

    #[test]
    fn test_validate_reports_duplicates_and_unknown_categories() {
        let catalog: SeedCatalog = serde_yaml::from_str(
            r"
categories:
  - { name: Tools, slug: tools }
  - { name: Tools again, slug: tools }
products:
  - { name: Saw, slug: saw, price: 20, category: tools }
  - { name: Saw, slug: saw, price: 20, category: garden }
",
        )
        .unwrap();
        let errors = validate(&catalog);
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    #[test]
    fn test_negative_price_rejected_at_parse() {
        let result: Result<SeedCatalog, _> = serde_yaml::from_str(
            r"
products:
  - { name: Refund, slug: refund, price: -5, category: tools }
",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("a/b.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("b.png")), "image/png");
        assert_eq!(
            content_type_for(Path::new("README")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_seed_is_rerunnable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("multimeter.png"), [0x89, b'P', b'N', b'G']).unwrap();
        let store = MemoryCatalogStore::new();

        let first = seed_catalog(&store, serde_yaml::from_str(CATALOG).unwrap(), dir.path())
            .await
            .unwrap();
        assert_eq!(
            first,
            SeedResult {
                categories_inserted: 2,
                categories_reused: 0,
                products_inserted: 2,
                products_skipped: 0,
            }
        );

        let meter = store
            .product_by_slug("digital-multimeter")
            .await
            .unwrap()
            .unwrap();
        let photo = store.product_photo(meter.id).await.unwrap().unwrap();
        assert_eq!(photo.content_type, "image/png");

        let second = seed_catalog(&store, serde_yaml::from_str(CATALOG).unwrap(), dir.path())
            .await
            .unwrap();
        assert_eq!(second.categories_reused, 2);
        assert_eq!(second.products_skipped, 2);
        assert_eq!(store.count_products().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_photo_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryCatalogStore::new();
        let result =
            seed_catalog(&store, serde_yaml::from_str(CATALOG).unwrap(), dir.path()).await;
        assert!(result.is_err());
    }
}
