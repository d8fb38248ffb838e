//! # Location
//!
//! Two-level administrative location: province and district (amphoe).

use crate::domain::errors::{DomainError, DomainResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Province and district of an order.
///
/// Both parts are trimmed and must be non-empty. Comparison is exact.
///
/// # Examples
///
/// ```
/// use produce_market::domain::value_objects::location::Location;
///
/// let loc = Location::new(" Khon Kaen ", "Mueang").unwrap();
/// assert_eq!(loc.province(), "Khon Kaen");
/// assert!(Location::new("", "Mueang").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    province: String,
    district: String,
}

impl Location {
    /// Creates a location.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidLocation` if either part is blank.
    pub fn new(province: impl Into<String>, district: impl Into<String>) -> DomainResult<Self> {
        let province = province.into().trim().to_string();
        let district = district.into().trim().to_string();
        if province.is_empty() {
            return Err(DomainError::InvalidLocation("province is empty".to_string()));
        }
        if district.is_empty() {
            return Err(DomainError::InvalidLocation("district is empty".to_string()));
        }
        Ok(Self { province, district })
    }

    /// Returns the province.
    #[inline]
    #[must_use]
    pub fn province(&self) -> &str {
        &self.province
    }

    /// Returns the district.
    #[inline]
    #[must_use]
    pub fn district(&self) -> &str {
        &self.district
    }

    /// Returns true if both locations share a district (and therefore a province).
    #[must_use]
    pub fn same_district(&self, other: &Self) -> bool {
        self == other
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.province, self.district)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trims_parts() {
        let loc = Location::new("  P1 ", " D1").unwrap();
        assert_eq!(loc.province(), "P1");
        assert_eq!(loc.district(), "D1");
        assert_eq!(loc.to_string(), "P1/D1");
    }

    #[test]
    fn rejects_blank_district() {
        assert!(matches!(
            Location::new("P1", "   "),
            Err(DomainError::InvalidLocation(_))
        ));
    }

    #[test]
    fn same_district_needs_same_province() {
        let a = Location::new("P1", "D1").unwrap();
        let b = Location::new("P2", "D1").unwrap();
        assert!(!a.same_district(&b));
        assert!(a.same_district(&Location::new("P1", "D1").unwrap()));
    }
}
