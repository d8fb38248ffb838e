//! # Domain Entities
//!
//! Aggregate roots representing core marketplace concepts.
//!
//! ## Aggregates
//!
//! - [`Order`]: A standing sell or buy offer
//! - [`Negotiation`]: A two-party offer thread over one order

pub mod negotiation;
pub mod order;

pub use negotiation::{Negotiation, Offer};
pub use order::{NewOrderParams, Order, PriceSnapshot};
