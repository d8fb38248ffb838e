//! # Domain Layer
//!
//! Core business types of the marketplace, free of persistence and
//! transport concerns.
//!
//! - [`entities`]: `Order` and `Negotiation` aggregates
//! - [`value_objects`]: identifiers, enums, prices and reference data
//! - [`errors`]: invariant violations

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use errors::{DomainError, DomainResult};
