//! # Price Evaluation
//!
//! Compares a requested price with the latest reference price for its
//! province and grade.
//!
//! # Deviation Calculation
//!
//! ```text
//! diff_percent = (requested - avg) * 100 / avg
//! ```
//!
//! The deviation is classified against a symmetric band (default ±20%):
//! `below_ref` at or below `-threshold`, `above_ref` at or above
//! `+threshold`, `normal` in between. A missing reference is not an error;
//! it yields `no_ref`.
//!
//! # Examples
//!
//! ```
//! use produce_market::application::services::price_evaluator::classify;
//! use produce_market::domain::value_objects::{Price, PriceStatus, PriceThresholdConfig};
//!
//! let config = PriceThresholdConfig::default();
//! let avg = Price::new(22.0).unwrap();
//! let (status, _) = classify(Price::new(27.0).unwrap(), avg, &config).unwrap();
//! assert_eq!(status, PriceStatus::AboveRef);
//! ```

use crate::application::error::ApplicationResult;
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::arithmetic::{ArithmeticError, CheckedArithmetic};
use crate::domain::value_objects::{
    Grade, Price, PriceEvaluation, PriceStatus, PriceThresholdConfig, ReferencePrice,
};
use crate::infrastructure::persistence::ReferencePriceRepository;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Computes the signed percent deviation of `requested` from `avg`.
///
/// # Errors
///
/// Returns `DomainError::Arithmetic` if `avg` is zero or the computation
/// overflows.
pub fn diff_percent(requested: Price, avg: Price) -> DomainResult<Decimal> {
    let avg = avg.get();
    if avg.is_zero() {
        return Err(ArithmeticError::DivisionByZero.into());
    }
    let diff = requested.get().safe_sub(avg)?;
    Ok(diff.safe_mul(HUNDRED)?.safe_div(avg)?)
}

/// Computes the deviation of `requested` from `avg` and classifies it.
///
/// # Errors
///
/// Same as [`diff_percent`].
pub fn classify(
    requested: Price,
    avg: Price,
    config: &PriceThresholdConfig,
) -> DomainResult<(PriceStatus, Decimal)> {
    let diff = diff_percent(requested, avg)?;
    Ok((config.classify(diff), diff))
}

/// Evaluates requested prices against stored reference prices.
#[derive(Debug, Clone)]
pub struct PriceEvaluator {
    references: Arc<dyn ReferencePriceRepository>,
    config: PriceThresholdConfig,
}

impl PriceEvaluator {
    /// Creates an evaluator with the default ±20% band.
    #[must_use]
    pub fn new(references: Arc<dyn ReferencePriceRepository>) -> Self {
        Self::with_config(references, PriceThresholdConfig::default())
    }

    /// Creates an evaluator with a custom band.
    #[must_use]
    pub fn with_config(
        references: Arc<dyn ReferencePriceRepository>,
        config: PriceThresholdConfig,
    ) -> Self {
        Self { references, config }
    }

    /// Returns the current configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &PriceThresholdConfig {
        &self.config
    }

    /// Returns the most recently updated reference for `province` and `grade`.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Repository` if the lookup fails.
    pub async fn get_reference_price(
        &self,
        province: &str,
        grade: Grade,
    ) -> ApplicationResult<Option<ReferencePrice>> {
        Ok(self.references.find_latest(province, grade).await?)
    }

    /// Evaluates `requested_price` against the latest reference.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::Repository` if the lookup fails
    /// - `ApplicationError::Domain` on arithmetic failure
    pub async fn evaluate_price(
        &self,
        province: &str,
        grade: Grade,
        requested_price: Price,
    ) -> ApplicationResult<PriceEvaluation> {
        let Some(reference) = self.get_reference_price(province, grade).await? else {
            debug!(province, %grade, "no reference price");
            return Ok(PriceEvaluation::no_reference());
        };

        let (status, diff) = classify(requested_price, reference.avg_price(), &self.config)?;
        debug!(
            province,
            %grade,
            requested = %requested_price,
            avg = %reference.avg_price(),
            diff_percent = %diff,
            %status,
            "price evaluated"
        );
        Ok(PriceEvaluation::with_reference(status, diff, reference))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::in_memory::InMemoryReferencePriceRepository;
    use crate::infrastructure::persistence::{RepositoryError, RepositoryResult};
    use async_trait::async_trait;
    use proptest::prelude::*;

    fn p(v: f64) -> Price {
        Price::new(v).unwrap()
    }

    async fn evaluator_with(province: &str, grade: Grade, avg: f64) -> PriceEvaluator {
        let repo = InMemoryReferencePriceRepository::new();
        repo.save(
            &ReferencePrice::new(province, grade, p(avg * 0.8), p(avg), p(avg * 1.2), "survey")
                .unwrap(),
        )
        .await
        .unwrap();
        PriceEvaluator::new(Arc::new(repo))
    }

    /// A repository that always fails.
    #[derive(Debug)]
    struct FailingRepository;

    #[async_trait]
    impl ReferencePriceRepository for FailingRepository {
        async fn find_latest(
            &self,
            _province: &str,
            _grade: Grade,
        ) -> RepositoryResult<Option<ReferencePrice>> {
            Err(RepositoryError::connection("down"))
        }

        async fn save(&self, _reference: &ReferencePrice) -> RepositoryResult<()> {
            Err(RepositoryError::connection("down"))
        }
    }

    mod diff_percent_tests {
        use super::*;

        #[test]
        fn zero_deviation() {
            assert_eq!(diff_percent(p(22.0), p(22.0)).unwrap(), Decimal::ZERO);
        }

        #[test]
        fn signed_deviation() {
            assert_eq!(diff_percent(p(11.0), p(10.0)).unwrap(), Decimal::TEN);
            assert_eq!(diff_percent(p(9.0), p(10.0)).unwrap(), -Decimal::TEN);
        }
    }

    mod classify_tests {
        use super::*;

        #[test]
        fn boundaries_are_inclusive() {
            let config = PriceThresholdConfig::default();
            assert_eq!(
                classify(p(8.0), p(10.0), &config).unwrap().0,
                PriceStatus::BelowRef
            );
            assert_eq!(
                classify(p(12.0), p(10.0), &config).unwrap().0,
                PriceStatus::AboveRef
            );
            assert_eq!(
                classify(p(11.99), p(10.0), &config).unwrap().0,
                PriceStatus::Normal
            );
        }

        #[test]
        fn custom_threshold() {
            let config = PriceThresholdConfig::new(Decimal::from(5)).unwrap();
            assert_eq!(
                classify(p(10.5), p(10.0), &config).unwrap().0,
                PriceStatus::AboveRef
            );
        }
    }

    mod evaluate {
        use super::*;

        #[tokio::test]
        async fn no_reference_is_not_an_error() {
            let evaluator = PriceEvaluator::new(Arc::new(InMemoryReferencePriceRepository::new()));
            let eval = evaluator
                .evaluate_price("P1", Grade::A, p(20.0))
                .await
                .unwrap();
            assert_eq!(eval.status(), PriceStatus::NoRef);
            assert!(eval.diff_percent().is_none());
            assert!(eval.reference().is_none());
        }

        #[tokio::test]
        async fn reference_average_22() {
            let evaluator = evaluator_with("X", Grade::B, 22.0).await;

            let below = evaluator.evaluate_price("X", Grade::B, p(17.0)).await.unwrap();
            assert_eq!(below.status(), PriceStatus::BelowRef);
            let normal = evaluator.evaluate_price("X", Grade::B, p(26.0)).await.unwrap();
            assert_eq!(normal.status(), PriceStatus::Normal);
            let above = evaluator.evaluate_price("X", Grade::B, p(27.0)).await.unwrap();
            assert_eq!(above.status(), PriceStatus::AboveRef);
            assert_eq!(above.ref_avg_price(), Some(p(22.0)));
        }

        #[tokio::test]
        async fn lookup_is_exact() {
            let evaluator = evaluator_with("X", Grade::B, 22.0).await;
            let eval = evaluator.evaluate_price("X", Grade::A, p(22.0)).await.unwrap();
            assert_eq!(eval.status(), PriceStatus::NoRef);
        }

        #[tokio::test]
        async fn repository_failure_propagates() {
            let evaluator = PriceEvaluator::new(Arc::new(FailingRepository));
            let err = evaluator
                .evaluate_price("X", Grade::B, p(22.0))
                .await
                .unwrap_err();
            assert!(err.is_infrastructure());
        }
    }

    proptest! {
        #[test]
        fn classification_is_consistent_with_band(
            requested_cents in 1i64..1_000_000,
            avg_cents in 1i64..1_000_000,
        ) {
            let requested = Price::from_decimal(Decimal::new(requested_cents, 2)).unwrap();
            let avg = Price::from_decimal(Decimal::new(avg_cents, 2)).unwrap();
            let config = PriceThresholdConfig::default();
            let (status, diff) = classify(requested, avg, &config).unwrap();
            let t = config.threshold_percent();
            match status {
                PriceStatus::BelowRef => prop_assert!(diff <= -t),
                PriceStatus::AboveRef => prop_assert!(diff >= t),
                PriceStatus::Normal => prop_assert!(diff > -t && diff < t),
                PriceStatus::NoRef => prop_assert!(false),
            }
            prop_assert_eq!(diff.is_sign_negative() && !diff.is_zero(), requested < avg);
        }
    }
}
