//! # Identifiers
//!
//! Strongly-typed identifiers for marketplace entities.
//!
//! - [`OrderId`], [`NegotiationId`], [`ReferencePriceId`]: UUID-based,
//!   generated when the entity is created
//! - [`UserId`]: string-based account identity of a farmer or factory
//!
//! # Examples
//!
//! ```
//! use produce_market::domain::value_objects::ids::{OrderId, UserId};
//!
//! let order = OrderId::new_v4();
//! let farmer = UserId::new("farmer-1");
//! assert_ne!(order, OrderId::new_v4());
//! assert_eq!(farmer.as_str(), "farmer-1");
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[inline]
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(
    /// Identifier of an [`Order`](crate::domain::entities::order::Order).
    OrderId
);

uuid_id!(
    /// Identifier of a [`Negotiation`](crate::domain::entities::negotiation::Negotiation).
    NegotiationId
);

uuid_id!(
    /// Identifier of a [`ReferencePrice`](crate::domain::value_objects::reference_price::ReferencePrice) record.
    ReferencePriceId
);

/// Account identity of a farmer or factory.
///
/// Opaque to the core; authentication happens upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
