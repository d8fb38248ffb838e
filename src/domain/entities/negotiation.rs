//! # Negotiation Aggregate
//!
//! One evolving offer thread between a farmer and a factory over one order.
//!
//! Each counter-offer while the thread is open replaces the current offered
//! price in place (a "round"); there is no round limit. Exactly one status
//! change ends the thread.
//!
//! # State Machine
//!
//! ```text
//! Open ──(submit_offer: loop)──┐
//!   ↑                          │
//!   └──────────────────────────┘
//! Open ─┬→ Accepted   (final_price := offered_price)
//!       ├→ Rejected
//!       └→ Cancelled
//! ```
//!
//! # Examples
//!
//! ```
//! use produce_market::domain::entities::negotiation::{Negotiation, Offer};
//! use produce_market::domain::entities::order::{NewOrderParams, Order};
//! use produce_market::domain::value_objects::{
//!     Grade, Location, NegotiationStatus, OrderType, Price, PriceEvaluation, Quantity, Side, UserId,
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
//! let mut negotiation = Negotiation::open(
//!     &order,
//!     UserId::new("farmer-1"),
//!     UserId::new("factory-1"),
//!     Offer::new(Side::Factory, Price::new(18.0).unwrap(), Quantity::new(500.0).unwrap()),
//! )
//! .unwrap();
//!
//! negotiation.accept().unwrap();
//! assert_eq!(negotiation.status(), NegotiationStatus::Accepted);
//! assert_eq!(negotiation.final_price(), Some(Price::new(18.0).unwrap()));
//! ```

use crate::domain::entities::order::Order;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::arithmetic::ArithmeticError;
use crate::domain::value_objects::enums::{Grade, PriceStatus, Side};
use crate::domain::value_objects::negotiation_status::NegotiationStatus;
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{NegotiationId, OrderId, Price, Quantity, UserId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single counter-offer made by one side.
///
/// The reference snapshot fields are optional: when absent, the existing
/// snapshot (or the order's, on creation) is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    /// Who is making the offer.
    pub side: Side,
    /// Proposed unit price.
    pub offered_price: Price,
    /// Proposed amount in kilograms.
    pub amount: Quantity,
    /// Refreshed reference average, if the proposer supplied one.
    pub ref_avg_price: Option<Price>,
    /// Refreshed classification, if the proposer supplied one.
    pub price_status: Option<PriceStatus>,
}

impl Offer {
    /// Creates an offer without a refreshed reference snapshot.
    #[must_use]
    pub fn new(side: Side, offered_price: Price, amount: Quantity) -> Self {
        Self {
            side,
            offered_price,
            amount,
            ref_avg_price: None,
            price_status: None,
        }
    }

    /// Attaches a refreshed reference snapshot.
    #[must_use]
    pub fn with_reference(mut self, ref_avg_price: Option<Price>, price_status: Option<PriceStatus>) -> Self {
        self.ref_avg_price = ref_avg_price;
        self.price_status = price_status;
        self
    }
}

/// Negotiation aggregate root.
///
/// # Invariants
///
/// - Farmer and factory are distinct accounts
/// - Order location, grade and original price are copied at creation and never change
/// - `Open` is the only status that accepts writes
/// - `final_price` is `Some` if and only if the status is `Accepted`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Negotiation {
    id: NegotiationId,
    order_id: OrderId,
    farmer_id: UserId,
    factory_id: UserId,
    province: String,
    district: String,
    grade: Grade,
    original_price: Price,
    amount: Quantity,
    offered_price: Price,
    final_price: Option<Price>,
    ref_avg_price: Option<Price>,
    price_status: PriceStatus,
    status: NegotiationStatus,
    last_side: Side,
    /// Number of offers made in this thread, including the opening one.
    round_count: u32,
    created_at: Timestamp,
    updated_at: Timestamp,
    /// Optimistic concurrency counter, maintained by the repositories.
    version: u64,
}

impl Negotiation {
    /// Opens a new negotiation thread over `order` with a first offer.
    ///
    /// The reference snapshot comes from the offer when supplied, otherwise
    /// from the order's creation-time snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SameParty` if farmer and factory are the same account.
    pub fn open(order: &Order, farmer_id: UserId, factory_id: UserId, offer: Offer) -> DomainResult<Self> {
        if farmer_id == factory_id {
            return Err(DomainError::SameParty(farmer_id.to_string()));
        }
        let now = Timestamp::now();
        let snapshot = order.snapshot();
        Ok(Self {
            id: NegotiationId::new_v4(),
            order_id: order.id(),
            farmer_id,
            factory_id,
            province: order.province().to_string(),
            district: order.district().to_string(),
            grade: order.grade(),
            original_price: order.requested_price(),
            amount: offer.amount,
            offered_price: offer.offered_price,
            final_price: None,
            ref_avg_price: offer.ref_avg_price.or(snapshot.ref_avg_price),
            price_status: offer.price_status.unwrap_or(snapshot.price_status),
            status: NegotiationStatus::Open,
            last_side: offer.side,
            round_count: 1,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Reconstructs a negotiation from storage.
    ///
    /// # Safety
    ///
    /// This method bypasses validation and should only be used when
    /// reconstructing from trusted storage.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: NegotiationId,
        order_id: OrderId,
        farmer_id: UserId,
        factory_id: UserId,
        province: String,
        district: String,
        grade: Grade,
        original_price: Price,
        amount: Quantity,
        offered_price: Price,
        final_price: Option<Price>,
        ref_avg_price: Option<Price>,
        price_status: PriceStatus,
        status: NegotiationStatus,
        last_side: Side,
        round_count: u32,
        created_at: Timestamp,
        updated_at: Timestamp,
        version: u64,
    ) -> Self {
        Self {
            id,
            order_id,
            farmer_id,
            factory_id,
            province,
            district,
            grade,
            original_price,
            amount,
            offered_price,
            final_price,
            ref_avg_price,
            price_status,
            status,
            last_side,
            round_count,
            created_at,
            updated_at,
            version,
        }
    }

    // ========== Accessors ==========

    /// Returns the negotiation ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> NegotiationId {
        self.id
    }

    /// Returns the order this negotiation is about.
    #[inline]
    #[must_use]
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Returns the farmer.
    #[inline]
    #[must_use]
    pub fn farmer_id(&self) -> &UserId {
        &self.farmer_id
    }

    /// Returns the factory.
    #[inline]
    #[must_use]
    pub fn factory_id(&self) -> &UserId {
        &self.factory_id
    }

    /// Returns the order's province at creation.
    #[inline]
    #[must_use]
    pub fn province(&self) -> &str {
        &self.province
    }

    /// Returns the order's district at creation.
    #[inline]
    #[must_use]
    pub fn district(&self) -> &str {
        &self.district
    }

    /// Returns the order's grade.
    #[inline]
    #[must_use]
    pub fn grade(&self) -> Grade {
        self.grade
    }

    /// Returns the order's original requested price.
    #[inline]
    #[must_use]
    pub fn original_price(&self) -> Price {
        self.original_price
    }

    /// Returns the amount under negotiation.
    #[inline]
    #[must_use]
    pub fn amount(&self) -> Quantity {
        self.amount
    }

    /// Returns the current offered price.
    #[inline]
    #[must_use]
    pub fn offered_price(&self) -> Price {
        self.offered_price
    }

    /// Returns the agreed price, set only on acceptance.
    #[inline]
    #[must_use]
    pub fn final_price(&self) -> Option<Price> {
        self.final_price
    }

    /// Returns the reference average snapshot.
    #[inline]
    #[must_use]
    pub fn ref_avg_price(&self) -> Option<Price> {
        self.ref_avg_price
    }

    /// Returns the reference classification snapshot.
    #[inline]
    #[must_use]
    pub fn price_status(&self) -> PriceStatus {
        self.price_status
    }

    /// Returns the current status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> NegotiationStatus {
        self.status
    }

    /// Returns which side made the latest offer.
    #[inline]
    #[must_use]
    pub fn last_side(&self) -> Side {
        self.last_side
    }

    /// Returns the number of offers made so far.
    #[inline]
    #[must_use]
    pub fn round_count(&self) -> u32 {
        self.round_count
    }

    /// Returns when this negotiation was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when this negotiation was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns the stored version.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns true if the negotiation is still open.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Returns the side `user` plays in this negotiation, if any.
    #[must_use]
    pub fn side_of(&self, user: &UserId) -> Option<Side> {
        if user == &self.farmer_id {
            Some(Side::Farmer)
        } else if user == &self.factory_id {
            Some(Side::Factory)
        } else {
            None
        }
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    // ========== State Transitions ==========

    fn ensure_open(&self) -> DomainResult<()> {
        if !self.status.is_open() {
            return Err(DomainError::NegotiationNotOpen(self.status));
        }
        Ok(())
    }

    /// Merges a new counter-offer into the open thread.
    ///
    /// Replaces the offered price, amount and last side. The reference
    /// snapshot is only replaced by the fields the offer supplies.
    ///
    /// # Errors
    ///
    /// - `DomainError::NegotiationNotOpen` if the thread is terminal
    /// - `DomainError::Arithmetic` if the round counter overflows
    pub fn submit_offer(&mut self, offer: Offer) -> DomainResult<()> {
        self.ensure_open()?;
        self.round_count = self
            .round_count
            .checked_add(1)
            .ok_or(ArithmeticError::Overflow)?;
        self.offered_price = offer.offered_price;
        self.amount = offer.amount;
        self.last_side = offer.side;
        if let Some(avg) = offer.ref_avg_price {
            self.ref_avg_price = Some(avg);
        }
        if let Some(status) = offer.price_status {
            self.price_status = status;
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Moves the negotiation to a terminal status.
    ///
    /// Acceptance fixes `final_price` to the current offered price.
    ///
    /// # Errors
    ///
    /// - `DomainError::NegotiationNotOpen` if already terminal
    /// - `DomainError::InvalidNegotiationStatusTransition` if `target` is `Open`
    pub fn transition_to(&mut self, target: NegotiationStatus) -> DomainResult<()> {
        self.ensure_open()?;
        if !self.status.can_transition_to(target) {
            return Err(DomainError::InvalidNegotiationStatusTransition {
                from: self.status,
                to: target,
            });
        }
        if target == NegotiationStatus::Accepted {
            self.final_price = Some(self.offered_price);
        }
        self.status = target;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Accepts the latest offer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NegotiationNotOpen` if already terminal.
    pub fn accept(&mut self) -> DomainResult<()> {
        self.transition_to(NegotiationStatus::Accepted)
    }

    /// Rejects the negotiation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NegotiationNotOpen` if already terminal.
    pub fn reject(&mut self) -> DomainResult<()> {
        self.transition_to(NegotiationStatus::Rejected)
    }

    /// Cancels the negotiation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NegotiationNotOpen` if already terminal.
    pub fn cancel(&mut self) -> DomainResult<()> {
        self.transition_to(NegotiationStatus::Cancelled)
    }
}

impl fmt::Display for Negotiation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Negotiation[{}] order={} status={} offered={} last_side={} rounds={}",
            self.id, self.order_id, self.status, self.offered_price, self.last_side, self.round_count
        )
    }
}
