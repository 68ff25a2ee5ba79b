//! Dharma Storefront library.
//!
//! This crate provides the catalog backend as a library, allowing it to be
//! tested and reused (the CLI seeds and migrates through it).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

/// Embedded catalog migrations (`crates/storefront/migrations/`).
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
