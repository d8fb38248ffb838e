//! # Domain Enums
//!
//! Enumeration types for marketplace concepts.
//!
//! - [`OrderType`] - Sell (farmer) or buy (factory) direction
//! - [`OrderStatus`] - Order lifecycle status
//! - [`Grade`] - Ordinal produce quality tier
//! - [`Side`] - Which counter-party made an offer
//! - [`PriceStatus`] - Classification against the reference price
//! - [`MatchPriority`] - Location tier of a match candidate
//!
//! All enums implement `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`,
//! `Display`, `FromStr`, and Serde traits. Wire names are snake_case.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of an order.
///
/// # Examples
///
/// ```
/// use produce_market::domain::value_objects::enums::OrderType;
///
/// assert_eq!(OrderType::Sell.opposite(), OrderType::Buy);
/// assert_eq!(OrderType::Buy.to_string(), "buy");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OrderType {
    /// A farmer offering produce.
    Sell = 0,
    /// A factory looking for produce.
    Buy = 1,
}

impl OrderType {
    /// Returns the opposite direction: sell seeks buy, buy seeks sell.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Sell => Self::Buy,
            Self::Buy => Self::Sell,
        }
    }

    /// Returns the side the order owner plays in a negotiation.
    #[inline]
    #[must_use]
    pub const fn owner_side(self) -> Side {
        match self {
            Self::Sell => Side::Farmer,
            Self::Buy => Side::Factory,
        }
    }

    /// Returns the snake_case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sell => "sell",
            Self::Buy => "buy",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sell" => Ok(Self::Sell),
            "buy" => Ok(Self::Buy),
            _ => Err(ParseEnumError::InvalidValue("OrderType", s.to_string())),
        }
    }
}

/// Order lifecycle status.
///
/// ```text
/// Open → Matched
///   ├──→ Closed
///   └──→ Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OrderStatus {
    /// Accepting negotiations.
    #[default]
    Open = 0,
    /// A negotiation was accepted against this order.
    Matched = 1,
    /// Closed by its owner.
    Closed = 2,
    /// Cancelled.
    Cancelled = 3,
}

impl OrderStatus {
    /// Returns true if this is a terminal status.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Returns true if the order may move to `target`.
    ///
    /// Only `Open` has outgoing transitions.
    ///
    /// # Examples
    ///
    /// ```
    /// use produce_market::domain::value_objects::enums::OrderStatus;
    ///
    /// assert!(OrderStatus::Open.can_transition_to(OrderStatus::Matched));
    /// assert!(!OrderStatus::Matched.can_transition_to(OrderStatus::Closed));
    /// ```
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Matched) | (Self::Open, Self::Closed) | (Self::Open, Self::Cancelled)
        )
    }

    /// Returns the snake_case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Matched => "matched",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "matched" => Ok(Self::Matched),
            "closed" => Ok(Self::Closed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError::InvalidValue("OrderStatus", s.to_string())),
        }
    }
}

/// Produce quality tier. `AA` is the highest grade.
///
/// Variants are declared best-first; [`Grade::rank`] exposes the ordinal
/// (0 = best).
///
/// # Examples
///
/// ```
/// use produce_market::domain::value_objects::enums::Grade;
///
/// assert!(Grade::AA.rank() < Grade::CC.rank());
/// assert_eq!("aa".parse::<Grade>().unwrap(), Grade::AA);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[repr(u8)]
pub enum Grade {
    /// Premium.
    AA = 0,
    /// First grade.
    A = 1,
    /// Second grade.
    B = 2,
    /// Third grade.
    C = 3,
    /// Lowest grade.
    CC = 4,
}

impl Grade {
    /// All grades, best first.
    pub const ALL: [Self; 5] = [Self::AA, Self::A, Self::B, Self::C, Self::CC];

    /// Returns the ordinal rank (0 = best).
    #[inline]
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AA => "AA",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::CC => "CC",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AA" => Ok(Self::AA),
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "CC" => Ok(Self::CC),
            _ => Err(ParseEnumError::InvalidValue("Grade", s.to_string())),
        }
    }
}

/// Counter-party role in a negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The seller of produce.
    Farmer,
    /// The buyer of produce.
    Factory,
}

impl Side {
    /// Returns the other party.
    #[inline]
    #[must_use]
    pub const fn counterparty(self) -> Self {
        match self {
            Self::Farmer => Self::Factory,
            Self::Factory => Self::Farmer,
        }
    }

    /// Returns the snake_case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Factory => "factory",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "farmer" => Ok(Self::Farmer),
            "factory" => Ok(Self::Factory),
            _ => Err(ParseEnumError::InvalidValue("Side", s.to_string())),
        }
    }
}

/// Classification of a requested price against the reference average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriceStatus {
    /// At or below the lower threshold.
    BelowRef,
    /// Strictly inside the band.
    Normal,
    /// At or above the upper threshold.
    AboveRef,
    /// No reference record existed for the province and grade.
    NoRef,
}

impl PriceStatus {
    /// Returns true if a reference price was available.
    #[inline]
    #[must_use]
    pub const fn has_reference(self) -> bool {
        !matches!(self, Self::NoRef)
    }

    /// Returns the snake_case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BelowRef => "below_ref",
            Self::Normal => "normal",
            Self::AboveRef => "above_ref",
            Self::NoRef => "no_ref",
        }
    }
}

impl fmt::Display for PriceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "below_ref" => Ok(Self::BelowRef),
            "normal" => Ok(Self::Normal),
            "above_ref" => Ok(Self::AboveRef),
            "no_ref" => Ok(Self::NoRef),
            _ => Err(ParseEnumError::InvalidValue("PriceStatus", s.to_string())),
        }
    }
}

/// Location tier of a match candidate.
///
/// Ordering is by priority: `SameAmphoe < SameProvince`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MatchPriority {
    /// Same district (amphoe).
    SameAmphoe,
    /// Same province, different district.
    SameProvince,
}

impl fmt::Display for MatchPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameAmphoe => write!(f, "same_amphoe"),
            Self::SameProvince => write!(f, "same_province"),
        }
    }
}

/// Error parsing an enum from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseEnumError {
    /// The value is not a valid variant.
    #[error("invalid {0} value: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod order_type {
        use super::*;

        #[test]
        fn opposite_flips_direction() {
            assert_eq!(OrderType::Sell.opposite(), OrderType::Buy);
            assert_eq!(OrderType::Buy.opposite(), OrderType::Sell);
        }

        #[test]
        fn owner_side() {
            assert_eq!(OrderType::Sell.owner_side(), Side::Farmer);
            assert_eq!(OrderType::Buy.owner_side(), Side::Factory);
        }

        #[test]
        fn parse_is_case_insensitive() {
            assert_eq!("SELL".parse::<OrderType>().unwrap(), OrderType::Sell);
            assert!("hold".parse::<OrderType>().is_err());
        }
    }

    mod order_status {
        use super::*;

        #[test]
        fn only_open_transitions() {
            for target in [
                OrderStatus::Matched,
                OrderStatus::Closed,
                OrderStatus::Cancelled,
            ] {
                assert!(OrderStatus::Open.can_transition_to(target));
            }
            for from in [
                OrderStatus::Matched,
                OrderStatus::Closed,
                OrderStatus::Cancelled,
            ] {
                assert!(from.is_terminal());
                for target in [
                    OrderStatus::Open,
                    OrderStatus::Matched,
                    OrderStatus::Closed,
                    OrderStatus::Cancelled,
                ] {
                    assert!(!from.can_transition_to(target));
                }
            }
        }

        #[test]
        fn open_cannot_self_transition() {
            assert!(!OrderStatus::Open.can_transition_to(OrderStatus::Open));
        }
    }

    mod grade {
        use super::*;

        #[test]
        fn ranks_are_ordinal() {
            let ranks: Vec<u8> = Grade::ALL.iter().map(|g| g.rank()).collect();
            assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
        }

        #[test]
        fn parse_and_display() {
            for grade in Grade::ALL {
                assert_eq!(grade.to_string().parse::<Grade>().unwrap(), grade);
            }
            assert!("D".parse::<Grade>().is_err());
        }

        #[test]
        fn serde_uses_labels() {
            assert_eq!(serde_json::to_string(&Grade::AA).unwrap(), "\"AA\"");
            let g: Grade = serde_json::from_str("\"CC\"").unwrap();
            assert_eq!(g, Grade::CC);
        }
    }

    mod price_status {
        use super::*;

        #[test]
        fn serde_is_snake_case() {
            assert_eq!(
                serde_json::to_string(&PriceStatus::BelowRef).unwrap(),
                "\"below_ref\""
            );
            assert_eq!(
                serde_json::to_string(&PriceStatus::NoRef).unwrap(),
                "\"no_ref\""
            );
        }

        #[test]
        fn parse_roundtrip() {
            for status in [
                PriceStatus::BelowRef,
                PriceStatus::Normal,
                PriceStatus::AboveRef,
                PriceStatus::NoRef,
            ] {
                assert_eq!(status.as_str().parse::<PriceStatus>().unwrap(), status);
            }
        }
    }

    #[test]
    fn match_priority_orders_amphoe_first() {
        assert!(MatchPriority::SameAmphoe < MatchPriority::SameProvince);
        assert_eq!(MatchPriority::SameAmphoe.to_string(), "same_amphoe");
    }

    #[test]
    fn side_counterparty() {
        assert_eq!(Side::Farmer.counterparty(), Side::Factory);
        assert_eq!("FACTORY".parse::<Side>().unwrap(), Side::Factory);
    }
}
