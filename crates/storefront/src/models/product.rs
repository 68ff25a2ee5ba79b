//! Product domain types that never leave the server as JSON.

use std::sync::Arc;

use dharma_core::{CategoryId, Price};

/// A product photo payload.
///
/// Bytes are reference counted so cached copies are cheap to hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// MIME type served as `Content-Type`.
    pub content_type: String,
    /// Raw image bytes.
    pub data: Arc<[u8]>,
}

impl Photo {
    #[must_use]
    pub fn new(content_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A category to insert (seeding only).
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
}

/// A product to insert (seeding only).
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Price,
    pub category: CategoryId,
    pub photo: Option<Photo>,
}
