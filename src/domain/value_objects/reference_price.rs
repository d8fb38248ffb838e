//! # Reference Price Types
//!
//! Value objects for evaluating a requested price against the market
//! reference for a province and grade.
//!
//! This module provides:
//! - [`ReferencePrice`]: Externally curated min/avg/max band per (province, grade)
//! - [`PriceThresholdConfig`]: Percentage band around the average
//! - [`PriceEvaluation`]: Classification outcome with the percent deviation
//!
//! # Examples
//!
//! ```
//! use produce_market::domain::value_objects::reference_price::PriceThresholdConfig;
//! use rust_decimal::Decimal;
//!
//! let config = PriceThresholdConfig::default();
//! assert_eq!(config.threshold_percent(), Decimal::new(20, 0));
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::enums::{Grade, PriceStatus};
use crate::domain::value_objects::ids::ReferencePriceId;
use crate::domain::value_objects::price::Price;
use crate::domain::value_objects::timestamp::Timestamp;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default classification band: ±20% of the reference average.
pub const DEFAULT_THRESHOLD_PERCENT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// An externally maintained price band for one (province, grade) pair.
///
/// Read-only for the decision core. When several records exist for the same
/// pair, the one with the latest `updated_at` is authoritative.
///
/// # Invariants
///
/// - `min_price <= avg_price <= max_price`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReferencePrice {
    id: ReferencePriceId,
    province: String,
    grade: Grade,
    min_price: Price,
    max_price: Price,
    avg_price: Price,
    /// Free-text origin tag, e.g. a ministry bulletin or a market survey.
    source: String,
    updated_at: Timestamp,
}

impl ReferencePrice {
    /// Creates a new reference band stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidReferencePrice` if the province is blank
    /// or the band is not ordered `min <= avg <= max`.
    pub fn new(
        province: impl Into<String>,
        grade: Grade,
        min_price: Price,
        avg_price: Price,
        max_price: Price,
        source: impl Into<String>,
    ) -> DomainResult<Self> {
        Self::from_parts(
            ReferencePriceId::new_v4(),
            province,
            grade,
            min_price,
            avg_price,
            max_price,
            source,
            Timestamp::now(),
        )
    }

    /// Reconstructs a reference band from stored values, revalidating it.
    ///
    /// # Errors
    ///
    /// Same as [`ReferencePrice::new`].
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ReferencePriceId,
        province: impl Into<String>,
        grade: Grade,
        min_price: Price,
        avg_price: Price,
        max_price: Price,
        source: impl Into<String>,
        updated_at: Timestamp,
    ) -> DomainResult<Self> {
        let province = province.into().trim().to_string();
        if province.is_empty() {
            return Err(DomainError::InvalidReferencePrice(
                "province is empty".to_string(),
            ));
        }
        if min_price > avg_price || avg_price > max_price {
            return Err(DomainError::InvalidReferencePrice(format!(
                "band must satisfy min <= avg <= max, got {min_price}/{avg_price}/{max_price}"
            )));
        }
        Ok(Self {
            id,
            province,
            grade,
            min_price,
            max_price,
            avg_price,
            source: source.into(),
            updated_at,
        })
    }

    /// Returns a copy stamped with a different update time.
    #[must_use]
    pub fn with_updated_at(mut self, updated_at: Timestamp) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Returns the record identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ReferencePriceId {
        self.id
    }

    /// Returns the province.
    #[inline]
    #[must_use]
    pub fn province(&self) -> &str {
        &self.province
    }

    /// Returns the grade.
    #[inline]
    #[must_use]
    pub fn grade(&self) -> Grade {
        self.grade
    }

    /// Returns the lower end of the band.
    #[inline]
    #[must_use]
    pub fn min_price(&self) -> Price {
        self.min_price
    }

    /// Returns the upper end of the band.
    #[inline]
    #[must_use]
    pub fn max_price(&self) -> Price {
        self.max_price
    }

    /// Returns the average price used for classification.
    #[inline]
    #[must_use]
    pub fn avg_price(&self) -> Price {
        self.avg_price
    }

    /// Returns the source tag.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns when the band was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns true if this record is for the given province and grade.
    #[must_use]
    pub fn applies_to(&self, province: &str, grade: Grade) -> bool {
        self.province == province && self.grade == grade
    }
}

impl fmt::Display for ReferencePrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReferencePrice[{} {}] avg={} ({}..{}) source={}",
            self.province, self.grade, self.avg_price, self.min_price, self.max_price, self.source
        )
    }
}

/// Percentage band for price classification.
///
/// A deviation at or beyond `±threshold_percent` leaves the `normal` band;
/// both boundaries are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceThresholdConfig {
    /// Band half-width in percent (e.g. `20` = ±20%).
    threshold_percent: Decimal,
}

impl PriceThresholdConfig {
    /// Creates a configuration with the given band half-width.
    ///
    /// Returns `None` if the threshold is not strictly positive.
    ///
    /// # Examples
    ///
    /// ```
    /// use produce_market::domain::value_objects::reference_price::PriceThresholdConfig;
    /// use rust_decimal::Decimal;
    ///
    /// assert!(PriceThresholdConfig::new(Decimal::new(15, 0)).is_some());
    /// assert!(PriceThresholdConfig::new(Decimal::ZERO).is_none());
    /// ```
    #[must_use]
    pub fn new(threshold_percent: Decimal) -> Option<Self> {
        if threshold_percent <= Decimal::ZERO {
            return None;
        }
        Some(Self { threshold_percent })
    }

    /// Returns the band half-width in percent.
    #[inline]
    #[must_use]
    pub const fn threshold_percent(&self) -> Decimal {
        self.threshold_percent
    }

    /// Classifies a percent deviation against the band.
    ///
    /// # Examples
    ///
    /// ```
    /// use produce_market::domain::value_objects::reference_price::PriceThresholdConfig;
    /// use produce_market::domain::value_objects::enums::PriceStatus;
    /// use rust_decimal::Decimal;
    ///
    /// let config = PriceThresholdConfig::default();
    /// assert_eq!(config.classify(Decimal::new(-20, 0)), PriceStatus::BelowRef);
    /// assert_eq!(config.classify(Decimal::new(1999, 2)), PriceStatus::Normal);
    /// assert_eq!(config.classify(Decimal::new(20, 0)), PriceStatus::AboveRef);
    /// ```
    #[must_use]
    pub fn classify(&self, diff_percent: Decimal) -> PriceStatus {
        if diff_percent <= -self.threshold_percent {
            PriceStatus::BelowRef
        } else if diff_percent >= self.threshold_percent {
            PriceStatus::AboveRef
        } else {
            PriceStatus::Normal
        }
    }
}

impl Default for PriceThresholdConfig {
    fn default() -> Self {
        Self {
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
        }
    }
}

/// Result of evaluating a requested price.
///
/// `diff_percent` and `reference` are `None` exactly when the status is
/// [`PriceStatus::NoRef`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PriceEvaluation {
    status: PriceStatus,
    diff_percent: Option<Decimal>,
    reference: Option<ReferencePrice>,
}

impl PriceEvaluation {
    /// Evaluation for a province/grade pair with no reference record.
    #[must_use]
    pub const fn no_reference() -> Self {
        Self {
            status: PriceStatus::NoRef,
            diff_percent: None,
            reference: None,
        }
    }

    /// Evaluation against an existing reference.
    #[must_use]
    pub fn with_reference(
        status: PriceStatus,
        diff_percent: Decimal,
        reference: ReferencePrice,
    ) -> Self {
        Self {
            status,
            diff_percent: Some(diff_percent),
            reference: Some(reference),
        }
    }

    /// Returns the classification.
    #[inline]
    #[must_use]
    pub fn status(&self) -> PriceStatus {
        self.status
    }

    /// Returns the signed percent deviation from the reference average.
    #[inline]
    #[must_use]
    pub fn diff_percent(&self) -> Option<Decimal> {
        self.diff_percent
    }

    /// Returns the reference record used, if any.
    #[inline]
    #[must_use]
    pub fn reference(&self) -> Option<&ReferencePrice> {
        self.reference.as_ref()
    }

    /// Returns the reference average, if any.
    #[must_use]
    pub fn ref_avg_price(&self) -> Option<Price> {
        self.reference.as_ref().map(ReferencePrice::avg_price)
    }
}

impl fmt::Display for PriceEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diff_percent {
            Some(diff) => write!(f, "{} ({}%)", self.status, diff.round_dp(2)),
            None => write!(f, "{}", self.status),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(v: f64) -> Price {
        Price::new(v).unwrap()
    }

    mod reference_price {
        use super::*;

        #[test]
        fn construction_and_accessors() {
            let rp = ReferencePrice::new("X", Grade::B, p(18.0), p(22.0), p(26.0), "survey")
                .unwrap();
            assert_eq!(rp.province(), "X");
            assert_eq!(rp.grade(), Grade::B);
            assert_eq!(rp.avg_price(), p(22.0));
            assert!(rp.applies_to("X", Grade::B));
            assert!(!rp.applies_to("X", Grade::A));
        }

        #[test]
        fn rejects_unordered_band() {
            let result = ReferencePrice::new("X", Grade::B, p(25.0), p(22.0), p(26.0), "survey");
            assert!(matches!(
                result,
                Err(DomainError::InvalidReferencePrice(_))
            ));
        }

        #[test]
        fn rejects_blank_province() {
            assert!(ReferencePrice::new(" ", Grade::B, p(1.0), p(2.0), p(3.0), "s").is_err());
        }

        #[test]
        fn serde_roundtrip() {
            let rp = ReferencePrice::new("X", Grade::AA, p(1.0), p(2.0), p(3.0), "s").unwrap();
            let json = serde_json::to_string(&rp).unwrap();
            let back: ReferencePrice = serde_json::from_str(&json).unwrap();
            assert_eq!(rp, back);
        }
    }

    mod threshold {
        use super::*;

        #[test]
        fn boundaries_are_inclusive() {
            let config = PriceThresholdConfig::default();
            assert_eq!(config.classify(Decimal::new(-20, 0)), PriceStatus::BelowRef);
            assert_eq!(config.classify(Decimal::new(20, 0)), PriceStatus::AboveRef);
            assert_eq!(config.classify(Decimal::new(-1999, 2)), PriceStatus::Normal);
            assert_eq!(config.classify(Decimal::ZERO), PriceStatus::Normal);
        }

        #[test]
        fn custom_threshold() {
            let config = PriceThresholdConfig::new(Decimal::new(10, 0)).unwrap();
            assert_eq!(config.classify(Decimal::new(10, 0)), PriceStatus::AboveRef);
            assert_eq!(config.classify(Decimal::new(9, 0)), PriceStatus::Normal);
        }

        #[test]
        fn rejects_non_positive() {
            assert!(PriceThresholdConfig::new(Decimal::NEGATIVE_ONE).is_none());
        }

        #[test]
        fn default_constant_is_twenty() {
            assert_eq!(DEFAULT_THRESHOLD_PERCENT, Decimal::new(20, 0));
        }
    }

    mod evaluation {
        use super::*;

        #[test]
        fn no_reference_has_no_diff() {
            let eval = PriceEvaluation::no_reference();
            assert_eq!(eval.status(), PriceStatus::NoRef);
            assert!(eval.diff_percent().is_none());
            assert!(eval.reference().is_none());
            assert!(eval.ref_avg_price().is_none());
            assert_eq!(eval.to_string(), "no_ref");
        }

        #[test]
        fn display_rounds_diff() {
            let rp = ReferencePrice::new("X", Grade::B, p(18.0), p(22.0), p(26.0), "s").unwrap();
            let eval =
                PriceEvaluation::with_reference(PriceStatus::Normal, Decimal::new(181818, 4), rp);
            assert_eq!(eval.to_string(), "normal (18.18%)");
            assert_eq!(eval.ref_avg_price(), Some(p(22.0)));
        }
    }
}
