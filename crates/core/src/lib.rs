//! Dharma Core - Shared catalog types.
//!
//! This crate provides the types shared by every Dharma component:
//! - `storefront` - REST backend serving the catalog
//! - `client` - Catalog controller and cart used by front ends
//! - `cli` - Migrations, seeding and a terminal catalog browser
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Both sides of the wire depend on it, so the JSON
//! contract in [`api`] is defined exactly once.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, price ranges, products, categories, filters
//! - [`api`] - Endpoint paths and request/response bodies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod types;

pub use types::*;
