//! Row types for the PostgreSQL adapters and their conversions into
//! domain entities.

use crate::domain::entities::negotiation::Negotiation;
use crate::domain::entities::order::{NewOrderParams, Order, PriceSnapshot};
use crate::domain::value_objects::{
    Grade, Location, NegotiationId, NegotiationStatus, OrderId, OrderStatus, OrderType, Price,
    PriceStatus, Quantity, ReferencePrice, ReferencePriceId, Side, Timestamp, UserId,
};
use crate::infrastructure::persistence::traits::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

pub(crate) const ORDER_COLUMNS: &str = "id, owner_id, order_type, province, district, grade, \
     quantity_kg, requested_price, status, ref_avg_price, price_status, diff_percent, \
     created_at, matched_at, final_price, version";

pub(crate) const NEGOTIATION_COLUMNS: &str = "id, order_id, farmer_id, factory_id, province, \
     district, grade, original_price, amount_kg, offered_price, final_price, ref_avg_price, \
     price_status, status, last_side, round_count, created_at, updated_at, version";

pub(crate) const REFERENCE_PRICE_COLUMNS: &str =
    "id, province, grade, min_price, avg_price, max_price, source, updated_at";

fn decode_err(e: impl Display) -> RepositoryError {
    RepositoryError::serialization(e.to_string())
}

fn parse<T>(value: &str) -> RepositoryResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(decode_err)
}

fn price(value: Decimal) -> RepositoryResult<Price> {
    Price::from_decimal(value).map_err(decode_err)
}

fn optional_price(value: Option<Decimal>) -> RepositoryResult<Option<Price>> {
    value.map(price).transpose()
}

/// Converts a domain version into the signed column type.
pub(crate) fn to_db_version(version: u64) -> RepositoryResult<i64> {
    i64::try_from(version).map_err(decode_err)
}

fn from_db_version(version: i64) -> RepositoryResult<u64> {
    u64::try_from(version).map_err(decode_err)
}

/// Converts a round counter into the signed column type.
pub(crate) fn to_db_rounds(rounds: u32) -> RepositoryResult<i32> {
    i32::try_from(rounds).map_err(decode_err)
}

/// Row type for order queries.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRow {
    id: Uuid,
    owner_id: String,
    order_type: String,
    province: String,
    district: String,
    grade: String,
    quantity_kg: Decimal,
    requested_price: Decimal,
    status: String,
    ref_avg_price: Option<Decimal>,
    price_status: String,
    diff_percent: Option<Decimal>,
    created_at: DateTime<Utc>,
    matched_at: Option<DateTime<Utc>>,
    final_price: Option<Decimal>,
    version: i64,
}

impl OrderRow {
    /// Converts the row into an Order.
    pub(crate) fn try_into_order(self) -> RepositoryResult<Order> {
        let params = NewOrderParams {
            owner: UserId::new(self.owner_id),
            order_type: parse::<OrderType>(&self.order_type)?,
            location: Location::new(self.province, self.district).map_err(decode_err)?,
            grade: parse::<Grade>(&self.grade)?,
            quantity: Quantity::from_decimal(self.quantity_kg).map_err(decode_err)?,
            requested_price: price(self.requested_price)?,
        };
        let snapshot = PriceSnapshot {
            ref_avg_price: optional_price(self.ref_avg_price)?,
            price_status: parse::<PriceStatus>(&self.price_status)?,
            diff_percent: self.diff_percent,
        };
        Ok(Order::from_parts(
            OrderId::from_uuid(self.id),
            params,
            parse::<OrderStatus>(&self.status)?,
            snapshot,
            Timestamp::from(self.created_at),
            self.matched_at.map(Timestamp::from),
            optional_price(self.final_price)?,
            from_db_version(self.version)?,
        ))
    }
}

/// Row type for negotiation queries.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct NegotiationRow {
    id: Uuid,
    order_id: Uuid,
    farmer_id: String,
    factory_id: String,
    province: String,
    district: String,
    grade: String,
    original_price: Decimal,
    amount_kg: Decimal,
    offered_price: Decimal,
    final_price: Option<Decimal>,
    ref_avg_price: Option<Decimal>,
    price_status: String,
    status: String,
    last_side: String,
    round_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl NegotiationRow {
    /// Converts the row into a Negotiation.
    pub(crate) fn try_into_negotiation(self) -> RepositoryResult<Negotiation> {
        Ok(Negotiation::from_parts(
            NegotiationId::from_uuid(self.id),
            OrderId::from_uuid(self.order_id),
            UserId::new(self.farmer_id),
            UserId::new(self.factory_id),
            self.province,
            self.district,
            parse::<Grade>(&self.grade)?,
            price(self.original_price)?,
            Quantity::from_decimal(self.amount_kg).map_err(decode_err)?,
            price(self.offered_price)?,
            optional_price(self.final_price)?,
            optional_price(self.ref_avg_price)?,
            parse::<PriceStatus>(&self.price_status)?,
            parse::<NegotiationStatus>(&self.status)?,
            parse::<Side>(&self.last_side)?,
            u32::try_from(self.round_count).map_err(decode_err)?,
            Timestamp::from(self.created_at),
            Timestamp::from(self.updated_at),
            from_db_version(self.version)?,
        ))
    }
}

/// Row type for reference price queries.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReferencePriceRow {
    id: Uuid,
    province: String,
    grade: String,
    min_price: Decimal,
    avg_price: Decimal,
    max_price: Decimal,
    source: String,
    updated_at: DateTime<Utc>,
}

impl ReferencePriceRow {
    /// Converts the row into a ReferencePrice.
    pub(crate) fn try_into_reference(self) -> RepositoryResult<ReferencePrice> {
        ReferencePrice::from_parts(
            ReferencePriceId::from_uuid(self.id),
            self.province,
            parse::<Grade>(&self.grade)?,
            price(self.min_price)?,
            price(self.avg_price)?,
            price(self.max_price)?,
            self.source,
            Timestamp::from(self.updated_at),
        )
        .map_err(decode_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order_row() -> OrderRow {
        OrderRow {
            id: Uuid::new_v4(),
            owner_id: "farmer-1".to_string(),
            order_type: "sell".to_string(),
            province: "P1".to_string(),
            district: "D1".to_string(),
            grade: "B".to_string(),
            quantity_kg: Decimal::from(500),
            requested_price: Decimal::from(22),
            status: "open".to_string(),
            ref_avg_price: Some(Decimal::from(20)),
            price_status: "normal".to_string(),
            diff_percent: Some(Decimal::TEN),
            created_at: Utc::now(),
            matched_at: None,
            final_price: None,
            version: 3,
        }
    }

    #[test]
    fn order_row_converts() {
        let order = order_row().try_into_order().unwrap();
        assert_eq!(order.order_type(), OrderType::Sell);
        assert_eq!(order.grade(), Grade::B);
        assert_eq!(order.snapshot().price_status, PriceStatus::Normal);
        assert_eq!(order.version(), 3);
    }

    #[test]
    fn unknown_enum_value_is_serialization_error() {
        let row = OrderRow {
            status: "archived".to_string(),
            ..order_row()
        };
        assert!(matches!(
            row.try_into_order(),
            Err(RepositoryError::Serialization(_))
        ));
    }

    #[test]
    fn non_positive_price_is_serialization_error() {
        let row = OrderRow {
            requested_price: Decimal::ZERO,
            ..order_row()
        };
        assert!(row.try_into_order().is_err());
    }

    #[test]
    fn negative_version_is_rejected() {
        let row = OrderRow {
            version: -1,
            ..order_row()
        };
        assert!(row.try_into_order().is_err());
        assert_eq!(to_db_version(7).unwrap(), 7);
    }
}
