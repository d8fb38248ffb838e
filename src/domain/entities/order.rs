//! # Order Aggregate
//!
//! A standing offer to sell or buy a quantity of graded produce at a location.
//!
//! # Lifecycle
//!
//! ```text
//! Open ─┬→ Matched    (negotiation accepted; final price + matched_at set)
//!       ├→ Closed
//!       └→ Cancelled
//! ```
//!
//! # Examples
//!
//! ```
//! use produce_market::domain::entities::order::{NewOrderParams, Order};
//! use produce_market::domain::value_objects::{
//!     Grade, Location, OrderStatus, OrderType, Price, PriceEvaluation, Quantity, UserId,
//! };
//!
//! let order = Order::new(
//!     NewOrderParams {
//!         owner: UserId::new("farmer-1"),
//!         order_type: OrderType::Sell,
//!         location: Location::new("P1", "D1").unwrap(),
//!         grade: Grade::A,
//!         quantity: Quantity::new(500.0).unwrap(),
//!         requested_price: Price::new(20.0).unwrap(),
//!     },
//!     &PriceEvaluation::no_reference(),
//! );
//!
//! assert_eq!(order.status(), OrderStatus::Open);
//! assert!(order.final_price().is_none());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::enums::{Grade, OrderStatus, OrderType, PriceStatus};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{
    Location, OrderId, Price, PriceEvaluation, Quantity, UserId,
};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference comparison captured when the order was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PriceSnapshot {
    /// Reference average at creation time.
    pub ref_avg_price: Option<Price>,
    /// Classification at creation time.
    pub price_status: PriceStatus,
    /// Signed percent deviation at creation time.
    pub diff_percent: Option<Decimal>,
}

impl PriceSnapshot {
    /// Snapshot for an order created without any reference record.
    #[must_use]
    pub const fn no_reference() -> Self {
        Self {
            ref_avg_price: None,
            price_status: PriceStatus::NoRef,
            diff_percent: None,
        }
    }
}

impl From<&PriceEvaluation> for PriceSnapshot {
    fn from(evaluation: &PriceEvaluation) -> Self {
        Self {
            ref_avg_price: evaluation.ref_avg_price(),
            price_status: evaluation.status(),
            diff_percent: evaluation.diff_percent(),
        }
    }
}

/// Caller-supplied attributes of a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderParams {
    /// Account placing the order.
    pub owner: UserId,
    /// Sell or buy.
    pub order_type: OrderType,
    /// Province and district.
    pub location: Location,
    /// Produce grade.
    pub grade: Grade,
    /// Weight in kilograms.
    pub quantity: Quantity,
    /// Requested unit price.
    pub requested_price: Price,
}

/// Order aggregate root.
///
/// # Invariants
///
/// - Quantity and requested price are strictly positive (by type)
/// - Status only moves out of `Open`, and only once
/// - `matched_at` and `final_price` are set together, exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Order {
    id: OrderId,
    owner: UserId,
    order_type: OrderType,
    location: Location,
    grade: Grade,
    quantity: Quantity,
    requested_price: Price,
    status: OrderStatus,
    snapshot: PriceSnapshot,
    created_at: Timestamp,
    matched_at: Option<Timestamp>,
    final_price: Option<Price>,
    /// Optimistic concurrency counter, maintained by the repositories.
    version: u64,
}

impl Order {
    /// Creates a new open order carrying the given price evaluation snapshot.
    #[must_use]
    pub fn new(params: NewOrderParams, evaluation: &PriceEvaluation) -> Self {
        Self {
            id: OrderId::new_v4(),
            owner: params.owner,
            order_type: params.order_type,
            location: params.location,
            grade: params.grade,
            quantity: params.quantity,
            requested_price: params.requested_price,
            status: OrderStatus::Open,
            snapshot: PriceSnapshot::from(evaluation),
            created_at: Timestamp::now(),
            matched_at: None,
            final_price: None,
            version: 0,
        }
    }

    /// Reconstructs an order from storage.
    ///
    /// # Safety
    ///
    /// This method bypasses lifecycle validation and should only be used
    /// when reconstructing from trusted storage.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: OrderId,
        params: NewOrderParams,
        status: OrderStatus,
        snapshot: PriceSnapshot,
        created_at: Timestamp,
        matched_at: Option<Timestamp>,
        final_price: Option<Price>,
        version: u64,
    ) -> Self {
        Self {
            id,
            owner: params.owner,
            order_type: params.order_type,
            location: params.location,
            grade: params.grade,
            quantity: params.quantity,
            requested_price: params.requested_price,
            status,
            snapshot,
            created_at,
            matched_at,
            final_price,
            version,
        }
    }

    // ========== Accessors ==========

    /// Returns the order ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the owner.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Returns the direction.
    #[inline]
    #[must_use]
    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Returns the location.
    #[inline]
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Returns the province.
    #[inline]
    #[must_use]
    pub fn province(&self) -> &str {
        self.location.province()
    }

    /// Returns the district.
    #[inline]
    #[must_use]
    pub fn district(&self) -> &str {
        self.location.district()
    }

    /// Returns the grade.
    #[inline]
    #[must_use]
    pub fn grade(&self) -> Grade {
        self.grade
    }

    /// Returns the quantity in kilograms.
    #[inline]
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Returns the requested unit price.
    #[inline]
    #[must_use]
    pub fn requested_price(&self) -> Price {
        self.requested_price
    }

    /// Returns the lifecycle status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the reference snapshot taken at creation.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &PriceSnapshot {
        &self.snapshot
    }

    /// Returns when the order was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the order was matched.
    #[inline]
    #[must_use]
    pub fn matched_at(&self) -> Option<Timestamp> {
        self.matched_at
    }

    /// Returns the agreed deal price.
    #[inline]
    #[must_use]
    pub fn final_price(&self) -> Option<Price> {
        self.final_price
    }

    /// Returns the stored version.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns true if the order still accepts negotiations.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    // ========== State Transitions ==========

    fn transition_to(&mut self, target: OrderStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::InvalidOrderStatusTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    /// Marks the order matched at the given deal price.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidOrderStatusTransition` if the order is not open.
    pub fn mark_matched(&mut self, final_price: Price, at: Timestamp) -> DomainResult<()> {
        self.transition_to(OrderStatus::Matched)?;
        self.final_price = Some(final_price);
        self.matched_at = Some(at);
        Ok(())
    }

    /// Closes the order without a match.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidOrderStatusTransition` if the order is not open.
    pub fn close(&mut self) -> DomainResult<()> {
        self.transition_to(OrderStatus::Closed)
    }

    /// Cancels the order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidOrderStatusTransition` if the order is not open.
    pub fn cancel(&mut self) -> DomainResult<()> {
        self.transition_to(OrderStatus::Cancelled)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order[{}] {} {} {} @ {} in {} status={}",
            self.id,
            self.order_type,
            self.quantity,
            self.grade,
            self.requested_price,
            self.location,
            self.status
        )
    }
}
