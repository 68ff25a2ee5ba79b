//! Prices and the fixed set of price ranges offered as filters.
//!
//! Prices are currency-agnostic decimals. On the wire they are JSON numbers,
//! which is what the storefront front end has always sent and displayed.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors constructing a price or price bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price must not be negative (got {0})")]
    Negative(Decimal),
    #[error("price range is inverted: {low} > {high}")]
    Inverted { low: Decimal, high: Decimal },
}

/// A non-negative amount of money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of currency units.
    #[must_use]
    pub fn whole(units: u32) -> Self {
        Self(Decimal::from(units))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

/// A closed price interval `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriceBounds {
    low: Price,
    high: Price,
}

impl PriceBounds {
    /// Create bounds, rejecting `low > high`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Inverted` if the interval is empty.
    pub fn new(low: Price, high: Price) -> Result<Self, PriceError> {
        if low > high {
            return Err(PriceError::Inverted {
                low: low.amount(),
                high: high.amount(),
            });
        }
        Ok(Self { low, high })
    }

    #[must_use]
    pub const fn low(&self) -> Price {
        self.low
    }

    #[must_use]
    pub const fn high(&self) -> Price {
        self.high
    }

    /// Whether `price` lies inside the interval (both ends inclusive).
    #[must_use]
    pub fn contains(&self, price: Price) -> bool {
        self.low <= price && price <= self.high
    }
}

/// One entry of the static price filter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriceRange {
    /// Stable identifier used by front ends and the CLI.
    pub id: u8,
    /// Display label.
    pub label: &'static str,
    low: u32,
    high: u32,
}

impl PriceRange {
    const fn new(id: u8, label: &'static str, low: u32, high: u32) -> Self {
        Self {
            id,
            label,
            low,
            high,
        }
    }

    /// Look up a range by its identifier.
    #[must_use]
    pub fn by_id(id: u8) -> Option<Self> {
        PRICE_RANGES.iter().copied().find(|range| range.id == id)
    }

    /// The interval this range selects.
    #[must_use]
    pub fn bounds(&self) -> PriceBounds {
        PriceBounds {
            low: Price::whole(self.low),
            high: Price::whole(self.high),
        }
    }
}

/// Price ranges shown next to the catalog, in display order.
pub const PRICE_RANGES: [PriceRange; 6] = [
    PriceRange::new(0, "0 to 19", 0, 19),
    PriceRange::new(1, "20 to 39", 20, 39),
    PriceRange::new(2, "40 to 59", 40, 59),
    PriceRange::new(3, "60 to 79", 60, 79),
    PriceRange::new(4, "80 to 99", 80, 99),
    PriceRange::new(5, "100 or more", 100, 9999),
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_price_rejected() {
        assert_eq!(
            Price::new(Decimal::from(-1)),
            Err(PriceError::Negative(Decimal::from(-1)))
        );
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_price_is_a_json_number() {
        let price = Price::new(Decimal::new(1999, 2)).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "19.99");

        let parsed: Price = serde_json::from_str("250").unwrap();
        assert_eq!(parsed, Price::whole(250));

        assert!(serde_json::from_str::<Price>("-5").is_err());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let bounds = PriceBounds::new(Price::whole(20), Price::whole(39)).unwrap();
        assert!(bounds.contains(Price::whole(20)));
        assert!(bounds.contains(Price::whole(39)));
        assert!(!bounds.contains(Price::whole(40)));
        assert!(!bounds.contains(Price::new(Decimal::new(1999, 2)).unwrap()));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(PriceBounds::new(Price::whole(50), Price::whole(10)).is_err());
    }

    #[test]
    fn test_price_ranges_are_ordered_and_disjoint() {
        for pair in PRICE_RANGES.windows(2) {
            let [a, b] = pair else { unreachable!() };
            assert!(a.bounds().high() < b.bounds().low());
        }
        assert_eq!(PriceRange::by_id(5).unwrap().label, "100 or more");
        assert!(PriceRange::by_id(42).is_none());
    }
}
