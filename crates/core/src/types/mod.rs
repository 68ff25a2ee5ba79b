//! Core types for the Dharma catalog.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod filter;
pub mod id;
pub mod price;

pub use catalog::{Category, ProductSummary};
pub use filter::{FilterError, FilterSelection, ProductFilter};
pub use id::*;
pub use price::{PRICE_RANGES, Price, PriceBounds, PriceError, PriceRange};
