//! Catalog filtering: the client's selection and the server's criteria.

use thiserror::Error;

use super::catalog::ProductSummary;
use super::id::CategoryId;
use super::price::{PriceBounds, PriceError, PriceRange};
use crate::api::ProductFilterRequest;

/// Errors turning a filter request into criteria.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("radio must be empty or [low, high], got {0} values")]
    RadioArity(usize),
    #[error(transparent)]
    Price(#[from] PriceError),
}

/// What the shopper has currently chosen in the filter sidebar.
///
/// Categories keep the order they were checked in; checking an already
/// checked category is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    categories: Vec<CategoryId>,
    price: Option<PriceRange>,
}

impl FilterSelection {
    /// Check or uncheck a category.
    pub fn toggle_category(&mut self, id: CategoryId, checked: bool) {
        if checked {
            if !self.categories.contains(&id) {
                self.categories.push(id);
            }
        } else {
            self.categories.retain(|c| *c != id);
        }
    }

    /// Select a price range, or clear it with `None`.
    pub fn select_price(&mut self, range: Option<PriceRange>) {
        self.price = range;
    }

    #[must_use]
    pub fn categories(&self) -> &[CategoryId] {
        &self.categories
    }

    #[must_use]
    pub const fn price(&self) -> Option<PriceRange> {
        self.price
    }

    /// True when nothing is selected, i.e. the unfiltered catalog applies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.price.is_none()
    }

    /// The request body the filter endpoint expects.
    #[must_use]
    pub fn to_request(&self) -> ProductFilterRequest {
        ProductFilterRequest {
            checked: self.categories.clone(),
            radio: self
                .price
                .map(|range| {
                    let bounds = range.bounds();
                    vec![bounds.low(), bounds.high()]
                })
                .unwrap_or_default(),
        }
    }
}

/// Server-side filter criteria.
///
/// Categories are OR-ed together; categories and price are AND-ed. An empty
/// category list or a missing price places no restriction on that axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub categories: Vec<CategoryId>,
    pub price: Option<PriceBounds>,
}

impl ProductFilter {
    /// True when neither axis restricts anything.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.categories.is_empty() && self.price.is_none()
    }

    /// Whether a product satisfies the criteria.
    #[must_use]
    pub fn matches(&self, product: &ProductSummary) -> bool {
        let category_ok =
            self.categories.is_empty() || self.categories.contains(&product.category);
        let price_ok = self
            .price
            .is_none_or(|bounds| bounds.contains(product.price));
        category_ok && price_ok
    }
}

impl TryFrom<ProductFilterRequest> for ProductFilter {
    type Error = FilterError;

    fn try_from(request: ProductFilterRequest) -> Result<Self, Self::Error> {
        let price = match request.radio.as_slice() {
            [] => None,
            [low, high] => Some(PriceBounds::new(*low, *high)?),
            other => return Err(FilterError::RadioArity(other.len())),
        };
        Ok(Self {
            categories: request.checked,
            price,
        })
    }
}
