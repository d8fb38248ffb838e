//! # Domain Errors
//!
//! Business rule violations raised by entities and value objects.

use crate::domain::value_objects::arithmetic::ArithmeticError;
use crate::domain::value_objects::enums::OrderStatus;
use crate::domain::value_objects::negotiation_status::NegotiationStatus;
use thiserror::Error;

/// Error raised when a domain invariant would be violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Price is not strictly positive.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// Quantity is not strictly positive.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Province or district is blank.
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// Reference band is malformed.
    #[error("invalid reference price: {0}")]
    InvalidReferencePrice(String),

    /// Page request is out of range.
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),

    /// Order status transition not allowed.
    #[error("invalid order status transition: {from} -> {to}")]
    InvalidOrderStatusTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },

    /// Negotiation is in a terminal state and accepts no further writes.
    #[error("negotiation is not open (status: {0})")]
    NegotiationNotOpen(NegotiationStatus),

    /// Negotiation status transition not allowed.
    #[error("invalid negotiation status transition: {from} -> {to}")]
    InvalidNegotiationStatusTransition {
        /// Current status.
        from: NegotiationStatus,
        /// Requested status.
        to: NegotiationStatus,
    },

    /// Both sides of a negotiation resolved to the same account.
    #[error("negotiation parties must differ: {0}")]
    SameParty(String),

    /// Checked arithmetic failed.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
