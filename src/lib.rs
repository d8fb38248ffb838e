//! # Produce Market
//!
//! Decision core for a two-sided produce marketplace where farmers sell and
//! factories buy.
//!
//! - **Price evaluation**: compares a requested price with the latest
//!   reference price for its province and grade
//! - **Order matching**: suggests counter-orders, same district first, then
//!   same province
//! - **Negotiation**: a two-party offer thread per order that, once
//!   accepted, matches the order in the same atomic write
//!
//! # Layers
//!
//! ```text
//! application   services, DTOs, ApplicationError
//! domain        Order / Negotiation aggregates, value objects, DomainError
//! infrastructure repository ports, in-memory and PostgreSQL adapters
//! ```
//!
//! HTTP routing and authentication live outside this crate; they call the
//! services in [`application::services`] and map
//! [`application::ApplicationError::code`] onto responses.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod market;
pub mod telemetry;

pub use application::{ApplicationError, ApplicationResult};
pub use market::Marketplace;
