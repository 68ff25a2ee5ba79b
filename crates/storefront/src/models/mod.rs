//! Domain models for the storefront.
//!
//! Listing types shared with clients live in `dharma_core`; the types here
//! only exist on the server side of the wire.

pub mod product;

pub use product::{NewCategory, NewProduct, Photo};
