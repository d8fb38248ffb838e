//! # Price Value Object
//!
//! Strictly positive unit price (currency per kilogram).

use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A strictly positive unit price.
///
/// # Examples
///
/// ```
/// use produce_market::domain::value_objects::price::Price;
/// use rust_decimal::Decimal;
///
/// let price = Price::new(22.5).unwrap();
/// assert_eq!(price.get(), Decimal::new(225, 1));
/// assert!(Price::new(0.0).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Creates a price from a float.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPrice` if the value is not finite or
    /// not strictly positive.
    pub fn new(value: f64) -> DomainResult<Self> {
        let decimal = Decimal::from_f64(value)
            .ok_or_else(|| DomainError::InvalidPrice(value.to_string()))?;
        Self::from_decimal(decimal)
    }

    /// Creates a price from a decimal.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPrice` if the value is not strictly positive.
    pub fn from_decimal(value: Decimal) -> DomainResult<Self> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidPrice(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Returns the decimal value.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_negative() {
        assert!(matches!(Price::new(0.0), Err(DomainError::InvalidPrice(_))));
        assert!(Price::new(-1.0).is_err());
        assert!(Price::from_decimal(Decimal::NEGATIVE_ONE).is_err());
    }

    #[test]
    fn rejects_non_finite() {
        assert!(Price::new(f64::NAN).is_err());
        assert!(Price::new(f64::INFINITY).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Price = serde_json::from_str("\"17.5\"").unwrap();
        assert_eq!(ok.get(), Decimal::new(175, 1));
        assert!(serde_json::from_str::<Price>("\"0\"").is_err());
    }
}
