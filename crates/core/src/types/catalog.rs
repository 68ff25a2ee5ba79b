//! Catalog records as they travel between the storefront and its clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;
use crate::api::paths;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A product without its photo payload.
///
/// Listing and filter responses carry these, and the cart stores them as
/// snapshots: a copy taken at add time, unaffected by later catalog edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Price,
    pub category: CategoryId,
    pub created_at: DateTime<Utc>,
}

impl ProductSummary {
    /// Relative URL of the product photo.
    #[must_use]
    pub fn photo_path(&self) -> String {
        paths::product_photo(self.id)
    }

    /// The first `max_chars` characters of the description, for cards.
    #[must_use]
    pub fn excerpt(&self, max_chars: usize) -> &str {
        self.description
            .char_indices()
            .nth(max_chars)
            .and_then(|(idx, _)| self.description.get(..idx))
            .unwrap_or(&self.description)
    }
}
