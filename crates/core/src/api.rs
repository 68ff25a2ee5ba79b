//! The storefront's JSON contract.
//!
//! Every body carries a `success` flag, which the front end has always
//! checked before trusting the payload.

use serde::{Deserialize, Serialize};

use crate::types::{Category, CategoryId, Price, ProductSummary};

/// Endpoint paths, shared by the router and the HTTP client.
pub mod paths {
    use crate::types::ProductId;

    pub const CATEGORIES: &str = "/api/v1/category/get-category";
    pub const PRODUCT_COUNT: &str = "/api/v1/product/product-count";
    pub const PRODUCT_FILTERS: &str = "/api/v1/product/product-filters";

    /// `GET` one page of the listing (1-based).
    #[must_use]
    pub fn product_list(page: u32) -> String {
        format!("/api/v1/product/product-list/{page}")
    }

    /// `GET` a product's photo bytes.
    #[must_use]
    pub fn product_photo(id: ProductId) -> String {
        format!("/api/v1/product/product-photo/{id}")
    }

    /// `GET` a single product by slug.
    #[must_use]
    pub fn product_by_slug(slug: &str) -> String {
        format!("/api/v1/product/get-product/{slug}")
    }
}

/// `GET /api/v1/category/get-category`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub success: bool,
    pub category: Vec<Category>,
}

/// Listing and filter responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<ProductSummary>,
}

/// `GET /api/v1/product/product-count`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCountResponse {
    pub success: bool,
    pub total: u64,
}

/// `GET /api/v1/product/get-product/{slug}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductResponse {
    pub success: bool,
    pub product: ProductSummary,
}

/// `POST /api/v1/product/product-filters`
///
/// `radio` is either empty or a `[low, high]` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilterRequest {
    #[serde(default)]
    pub checked: Vec<CategoryId>,
    #[serde(default)]
    pub radio: Vec<Price>,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
