//! # Application Errors
//!
//! Error types for the application layer.
//!
//! These are the failures the routing layer sees. Each variant maps to a
//! stable snake_case code via [`ApplicationError::code`].
//!
//! # Error Hierarchy
//!
//! ```text
//! ApplicationError
//! ├── OrderNotFound / NegotiationNotFound          - not found
//! ├── OrderNotOpen / NegotiationNotOpen            - invariant violations
//! ├── ActorNotRelatedToOrder / ActorNotInNegotiation
//! ├── Validation(String)                           - input validation failures
//! ├── Domain(DomainError)                          - entity rule violations
//! └── Repository(RepositoryError)                  - persistence failures
//! ```
//!
//! # Examples
//!
//! ```
//! use produce_market::application::error::ApplicationError;
//!
//! let err = ApplicationError::validation("limit must be between 1 and 50");
//! assert_eq!(err.code(), "validation_error");
//! ```

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{NegotiationId, NegotiationStatus, OrderId, OrderStatus, UserId};
use crate::infrastructure::persistence::RepositoryError;
use thiserror::Error;

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// No order with this ID.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// No negotiation with this ID.
    #[error("negotiation not found: {0}")]
    NegotiationNotFound(NegotiationId),

    /// The order no longer accepts negotiation.
    #[error("order {order_id} is not open (status: {status})")]
    OrderNotOpen {
        /// Order identifier.
        order_id: OrderId,
        /// Current status.
        status: OrderStatus,
    },

    /// The negotiation already reached a terminal status.
    #[error("negotiation {negotiation_id} is not open (status: {status})")]
    NegotiationNotOpen {
        /// Negotiation identifier.
        negotiation_id: NegotiationId,
        /// Current status.
        status: NegotiationStatus,
    },

    /// The actor cannot take part in a negotiation over this order.
    #[error("actor {actor} is not related to order {order_id}")]
    ActorNotRelatedToOrder {
        /// Order identifier.
        order_id: OrderId,
        /// Acting account.
        actor: UserId,
    },

    /// The actor is neither the farmer nor the factory of the negotiation.
    #[error("actor {actor} is not a party to negotiation {negotiation_id}")]
    ActorNotInNegotiation {
        /// Negotiation identifier.
        negotiation_id: NegotiationId,
        /// Acting account.
        actor: UserId,
    },

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Domain error from business logic.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Persistence failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ApplicationError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the stable error code reported to callers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::OrderNotFound(_) => "order_not_found",
            Self::NegotiationNotFound(_) => "negotiation_not_found",
            Self::OrderNotOpen { .. } => "order_not_open",
            Self::NegotiationNotOpen { .. } => "negotiation_not_open",
            Self::ActorNotRelatedToOrder { .. } => "actor_not_related_to_order",
            Self::ActorNotInNegotiation { .. } => "actor_not_in_negotiation",
            Self::Validation(_) => "validation_error",
            Self::Domain(e) => match e {
                DomainError::NegotiationNotOpen(_) => "negotiation_not_open",
                DomainError::InvalidOrderStatusTransition { .. } => "order_not_open",
                DomainError::InvalidNegotiationStatusTransition { .. } => "validation_error",
                DomainError::SameParty(_) => "actor_not_related_to_order",
                DomainError::Arithmetic(_) => "arithmetic_error",
                _ => "validation_error",
            },
            Self::Repository(e) if e.is_version_conflict() || e.is_duplicate() => {
                "concurrent_modification"
            }
            Self::Repository(_) => "infrastructure_error",
        }
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::OrderNotFound(_) | Self::NegotiationNotFound(_)
        )
    }

    /// Returns true if the request broke a state or participation rule.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::OrderNotOpen { .. }
                | Self::NegotiationNotOpen { .. }
                | Self::ActorNotRelatedToOrder { .. }
                | Self::ActorNotInNegotiation { .. }
                | Self::Domain(
                    DomainError::NegotiationNotOpen(_)
                        | DomainError::InvalidOrderStatusTransition { .. }
                        | DomainError::SameParty(_)
                )
        )
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.code() == "validation_error"
    }

    /// Returns true if a concurrent writer won a race; the caller may retry.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Repository(e) if e.is_version_conflict() || e.is_duplicate())
    }

    /// Returns true if the persistence layer failed.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Repository(_)) && !self.is_conflict()
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
