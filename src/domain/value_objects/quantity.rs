//! # Quantity Value Object
//!
//! Strictly positive weight in kilograms.

use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A strictly positive quantity in kilograms.
///
/// # Examples
///
/// ```
/// use produce_market::domain::value_objects::quantity::Quantity;
///
/// let qty = Quantity::new(1500.0).unwrap();
/// assert_eq!(qty.to_string(), "1500 kg");
/// assert!(Quantity::new(-3.0).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl Quantity {
    /// Creates a quantity from a float.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuantity` if the value is not finite or
    /// not strictly positive.
    pub fn new(kg: f64) -> DomainResult<Self> {
        let decimal =
            Decimal::from_f64(kg).ok_or_else(|| DomainError::InvalidQuantity(kg.to_string()))?;
        Self::from_decimal(decimal)
    }

    /// Creates a quantity from a decimal.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuantity` if the value is not strictly positive.
    pub fn from_decimal(kg: Decimal) -> DomainResult<Self> {
        if kg <= Decimal::ZERO {
            return Err(DomainError::InvalidQuantity(kg.to_string()));
        }
        Ok(Self(kg))
    }

    /// Returns the weight in kilograms.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kg", self.0)
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(qty: Quantity) -> Self {
        qty.0
    }
}
