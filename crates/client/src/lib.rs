//! Dharma catalog client.
//!
//! - [`api`] - HTTP client for the storefront catalog API
//! - [`controller`] - browse/filter/load-more state machine and its async driver
//! - [`cart`] - durable shopping cart
//! - [`config`] - environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod controller;

pub use api::{CatalogApi, ClientError, HttpCatalogClient};
pub use cart::{CartStore, DurableStorage, FileStorage, MemoryStorage, Notice};
pub use config::ClientConfig;
pub use controller::{CatalogController, CatalogState, Event};
