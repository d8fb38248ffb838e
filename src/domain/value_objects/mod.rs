//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`OrderId`], [`NegotiationId`], [`ReferencePriceId`]: UUID-based identifiers
//! - [`UserId`]: String-based account identifier
//!
//! ## Numeric Types
//!
//! - [`Price`]: Strictly positive decimal unit price
//! - [`Quantity`]: Strictly positive decimal weight in kilograms
//!
//! ## Domain Enums
//!
//! - [`OrderType`], [`OrderStatus`], [`Grade`], [`Side`], [`PriceStatus`],
//!   [`MatchPriority`]
//! - [`NegotiationStatus`]: Negotiation lifecycle state machine

pub mod arithmetic;
pub mod enums;
pub mod ids;
pub mod location;
pub mod negotiation_status;
pub mod pagination;
pub mod price;
pub mod quantity;
pub mod reference_price;
pub mod timestamp;

pub use arithmetic::{ArithmeticError, ArithmeticResult, CheckedArithmetic};
pub use enums::{Grade, MatchPriority, OrderStatus, OrderType, ParseEnumError, PriceStatus, Side};
pub use ids::{NegotiationId, OrderId, ReferencePriceId, UserId};
pub use location::Location;
pub use negotiation_status::NegotiationStatus;
pub use pagination::Pagination;
pub use price::Price;
pub use quantity::Quantity;
pub use reference_price::{PriceEvaluation, PriceThresholdConfig, ReferencePrice};
pub use timestamp::Timestamp;
