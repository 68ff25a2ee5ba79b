//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog` - Listing, filtering, product lookup and photo retrieval

pub mod catalog;

pub use catalog::{CatalogError, CatalogService};
