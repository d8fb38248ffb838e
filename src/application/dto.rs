//! # Data Transfer Objects
//!
//! Request and response shapes exchanged with the routing layer.
//!
//! All types derive `serde` and `schemars::JsonSchema`; the
//! `export_schemas` binary writes their schemas to disk.
//!
//! Requests carry raw decimals; conversion into validated domain values
//! happens in the `into_*` methods so invalid input surfaces as a
//! `validation_error`.

use crate::application::error::ApplicationResult;
use crate::domain::entities::negotiation::Offer;
use crate::domain::entities::order::{NewOrderParams, Order};
use crate::domain::value_objects::{
    Grade, Location, MatchPriority, NegotiationId, NegotiationStatus, OrderId, OrderType, Price,
    PriceEvaluation, PriceStatus, Quantity, Side, UserId,
};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Request to place a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NewOrder {
    /// Account placing the order.
    pub owner: UserId,
    /// `sell` (farmer) or `buy` (factory).
    pub order_type: OrderType,
    /// Province name.
    pub province: String,
    /// District (amphoe) name.
    pub district: String,
    /// Produce grade.
    pub grade: Grade,
    /// Weight in kilograms.
    pub quantity_kg: Decimal,
    /// Requested unit price.
    pub requested_price: Decimal,
}

impl NewOrder {
    /// Validates the request into order parameters.
    ///
    /// # Errors
    ///
    /// Returns a domain validation error for a blank location or a
    /// non-positive quantity or price.
    pub fn into_params(self) -> ApplicationResult<NewOrderParams> {
        Ok(NewOrderParams {
            owner: self.owner,
            order_type: self.order_type,
            location: Location::new(self.province, self.district)?,
            grade: self.grade,
            quantity: Quantity::from_decimal(self.quantity_kg)?,
            requested_price: Price::from_decimal(self.requested_price)?,
        })
    }
}

/// An order together with the evaluation taken when it was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CreatedOrder {
    /// The stored order.
    pub order: Order,
    /// Reference comparison of its requested price.
    pub evaluation: PriceEvaluation,
}

/// Request to evaluate a price without placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PriceCheck {
    /// Province name.
    pub province: String,
    /// Produce grade.
    pub grade: Grade,
    /// Price to evaluate.
    pub requested_price: Decimal,
}

/// One counter-order suggested for a source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MatchCandidate {
    /// The counter-order.
    pub order: Order,
    /// Location tier it was found in.
    pub priority: MatchPriority,
}

/// A counter-offer on an order.
///
/// Creates the negotiation for the (order, farmer, factory) triple on the
/// first call and merges into it while it stays open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CounterOffer {
    /// Order being negotiated.
    pub order_id: OrderId,
    /// Account making the offer.
    pub actor: UserId,
    /// Proposed unit price.
    pub offered_price: Decimal,
    /// Proposed amount in kilograms.
    pub amount_kg: Decimal,
    /// Refreshed reference average, if the caller has one.
    #[serde(default)]
    pub ref_avg_price: Option<Decimal>,
    /// Refreshed reference classification, if the caller has one.
    #[serde(default)]
    pub price_status: Option<PriceStatus>,
}

impl CounterOffer {
    /// Validates the request into a domain offer made by `side`.
    ///
    /// # Errors
    ///
    /// Returns a domain validation error for a non-positive price or amount.
    pub fn to_offer(&self, side: Side) -> ApplicationResult<Offer> {
        let ref_avg_price = self.ref_avg_price.map(Price::from_decimal).transpose()?;
        Ok(Offer::new(
            side,
            Price::from_decimal(self.offered_price)?,
            Quantity::from_decimal(self.amount_kg)?,
        )
        .with_reference(ref_avg_price, self.price_status))
    }
}

/// Request to move a negotiation to a terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StatusUpdate {
    /// Negotiation to update.
    pub negotiation_id: NegotiationId,
    /// Account requesting the change.
    pub actor: UserId,
    /// `accepted`, `rejected` or `cancelled`.
    pub status: NegotiationStatus,
}
