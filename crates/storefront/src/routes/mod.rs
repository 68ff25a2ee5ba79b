//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                  - Liveness check
//! GET  /health/ready                            - Readiness check (store ping)
//!
//! # Categories
//! GET  /api/v1/category/get-category            - All categories
//!
//! # Products
//! GET  /api/v1/product/product-list/{page}      - Listing page (1-based)
//! GET  /api/v1/product/product-count            - Total product count
//! POST /api/v1/product/product-filters          - Filter by categories/price
//! GET  /api/v1/product/product-photo/{id}       - Photo bytes
//! GET  /api/v1/product/get-product/{slug}       - Single product
//! ```

pub mod categories;
pub mod health;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new().route("/get-category", get(categories::index))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/product-list/{page}", get(products::list))
        .route("/product-count", get(products::count))
        .route("/product-filters", post(products::filter))
        .route("/product-photo/{id}", get(products::photo))
        .route("/get-product/{slug}", get(products::show))
}

/// Create the versioned JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/category", category_routes())
        .nest("/product", product_routes())
}

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// Create all routes for the storefront (without rate limiting).
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .nest("/api/v1", api_routes())
}
