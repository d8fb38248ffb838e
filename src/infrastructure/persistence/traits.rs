//! # Repository Traits
//!
//! Port definitions for persistence abstraction.
//!
//! This module defines the repository traits (ports) that abstract
//! persistence operations. The crate ships an in-memory backend for tests
//! and embedding, and a PostgreSQL backend.
//!
//! # Available Ports
//!
//! - [`OrderRepository`]: Persistence for orders
//! - [`NegotiationRepository`]: Persistence for negotiations
//! - [`ReferencePriceRepository`]: Read access to reference prices
//! - [`UnitOfWork`]: All-or-nothing commit of a [`WriteBatch`]
//!
//! # Versioning
//!
//! Every stored order and negotiation carries a `version`. Inserts store
//! version 0. Every update is checked against the version the caller
//! loaded, and a successful write stores `loaded + 1`. A mismatch fails with
//! [`RepositoryError::VersionConflict`] and writes nothing.
//!
//! # Examples
//!
//! ```ignore
//! use produce_market::infrastructure::persistence::traits::OrderRepository;
//!
//! async fn show(repo: &impl OrderRepository, id: OrderId) {
//!     if let Some(order) = repo.get(&id).await? {
//!         println!("{order}");
//!     }
//! }
//! ```

use crate::domain::entities::negotiation::Negotiation;
use crate::domain::entities::order::Order;
use crate::domain::value_objects::{
    Grade, NegotiationId, OrderId, OrderType, Pagination, ReferencePrice, UserId,
};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Duplicate entity.
    #[error("Duplicate entity: {entity_type} with id {id} already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Optimistic locking conflict.
    #[error("Version conflict: {entity_type} with id {id} has been modified")]
    VersionConflict {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
        /// Expected version.
        expected: u64,
        /// Actual version.
        actual: u64,
    },

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query error.
    #[error("Query error: {0}")]
    Query(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a version conflict error.
    #[must_use]
    pub fn version_conflict(
        entity_type: &'static str,
        id: impl Into<String>,
        expected: u64,
        actual: u64,
    ) -> Self {
        Self::VersionConflict {
            entity_type,
            id: id.into(),
            expected,
            actual,
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a duplicate error.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Returns true if this is a version conflict error.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Filter for open orders on the other side of a source order.
///
/// Results are restricted to `status = open`, ordered by `created_at`
/// descending and capped at `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterOrderQuery {
    /// Type the candidates must have (opposite of the source).
    pub order_type: OrderType,
    /// Grade the candidates must have.
    pub grade: Grade,
    /// Province the candidates must be in.
    pub province: String,
    /// District the candidates must be in, or `None` for any district.
    pub district: Option<String>,
    /// Maximum number of rows to return.
    pub limit: usize,
}

impl CounterOrderQuery {
    /// Builds a query for counter-orders of `source` within its province.
    #[must_use]
    pub fn for_source(source: &Order, limit: usize) -> Self {
        Self {
            order_type: source.order_type().opposite(),
            grade: source.grade(),
            province: source.province().to_string(),
            district: None,
            limit,
        }
    }

    /// Restricts the query to one district.
    #[must_use]
    pub fn in_district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }

    /// Returns true if `order` satisfies this filter, ignoring `limit`.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        order.is_open()
            && order.order_type() == self.order_type
            && order.grade() == self.grade
            && order.province() == self.province
            && self
                .district
                .as_deref()
                .is_none_or(|district| order.district() == district)
    }
}

/// A single versioned write inside a [`WriteBatch`].
///
/// The entity's `version()` is the version the caller loaded; the commit
/// fails if the stored version differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    /// Replace a stored order.
    Order(Order),
    /// Replace a stored negotiation.
    Negotiation(Negotiation),
}

impl Write {
    /// Returns the entity type name for error reporting.
    #[must_use]
    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::Order(_) => "Order",
            Self::Negotiation(_) => "Negotiation",
        }
    }

    /// Returns the identifier of the written entity.
    #[must_use]
    pub fn entity_id(&self) -> String {
        match self {
            Self::Order(order) => order.id().to_string(),
            Self::Negotiation(negotiation) => negotiation.id().to_string(),
        }
    }

    /// Returns the version the caller expects to be stored.
    #[must_use]
    pub fn expected_version(&self) -> u64 {
        match self {
            Self::Order(order) => order.version(),
            Self::Negotiation(negotiation) => negotiation.version(),
        }
    }
}

/// An ordered set of updates committed all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an order update.
    #[must_use]
    pub fn update_order(mut self, order: Order) -> Self {
        self.writes.push(Write::Order(order));
        self
    }

    /// Adds a negotiation update.
    #[must_use]
    pub fn update_negotiation(mut self, negotiation: Negotiation) -> Self {
        self.writes.push(Write::Negotiation(negotiation));
        self
    }

    /// Returns the writes in insertion order.
    #[must_use]
    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    /// Returns the number of writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns true if the batch holds no writes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl IntoIterator for WriteBatch {
    type Item = Write;
    type IntoIter = std::vec::IntoIter<Write>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

/// Repository for orders.
#[async_trait]
pub trait OrderRepository: Send + Sync + fmt::Debug {
    /// Gets an order by ID.
    ///
    /// Returns `None` if the order does not exist.
    async fn get(&self, id: &OrderId) -> RepositoryResult<Option<Order>>;

    /// Returns true if an order with this ID exists.
    async fn exists(&self, id: &OrderId) -> RepositoryResult<bool>;

    /// Inserts a new order at version 0.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the ID is already stored.
    async fn insert(&self, order: &Order) -> RepositoryResult<()>;

    /// Finds open orders matching `query`, newest first.
    async fn find_open_counter_orders(
        &self,
        query: &CounterOrderQuery,
    ) -> RepositoryResult<Vec<Order>>;

    /// Lists orders placed by `owner`, newest first.
    async fn list_by_owner(
        &self,
        owner: &UserId,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Order>>;
}

/// Repository for negotiations.
#[async_trait]
pub trait NegotiationRepository: Send + Sync + fmt::Debug {
    /// Gets a negotiation by ID.
    ///
    /// Returns `None` if the negotiation does not exist.
    async fn get(&self, id: &NegotiationId) -> RepositoryResult<Option<Negotiation>>;

    /// Inserts a new negotiation at version 0.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the ID is already stored, or
    /// if an open negotiation already exists for the same order, farmer
    /// and factory.
    async fn insert(&self, negotiation: &Negotiation) -> RepositoryResult<()>;

    /// Replaces a stored negotiation.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the negotiation is not stored
    /// - `RepositoryError::VersionConflict` if it changed since it was loaded
    async fn update(&self, negotiation: &Negotiation) -> RepositoryResult<()>;

    /// Finds the most recently updated open negotiation for a triple.
    async fn find_latest_open(
        &self,
        order_id: &OrderId,
        farmer_id: &UserId,
        factory_id: &UserId,
    ) -> RepositoryResult<Option<Negotiation>>;

    /// Lists negotiations on one order, most recently updated first.
    async fn list_by_order(
        &self,
        order_id: &OrderId,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Negotiation>>;

    /// Lists negotiations where `farmer_id` is the farmer, most recently updated first.
    async fn list_by_farmer(
        &self,
        farmer_id: &UserId,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Negotiation>>;

    /// Lists negotiations where `factory_id` is the factory, most recently updated first.
    async fn list_by_factory(
        &self,
        factory_id: &UserId,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Negotiation>>;
}

/// Repository for reference prices.
#[async_trait]
pub trait ReferencePriceRepository: Send + Sync + fmt::Debug {
    /// Finds the most recently updated reference for a province and grade.
    ///
    /// Matching is exact; there is no fallback to other provinces or grades.
    async fn find_latest(
        &self,
        province: &str,
        grade: Grade,
    ) -> RepositoryResult<Option<ReferencePrice>>;

    /// Stores a reference price record.
    async fn save(&self, reference: &ReferencePrice) -> RepositoryResult<()>;
}

/// Commits several writes as one atomic unit.
#[async_trait]
pub trait UnitOfWork: Send + Sync + fmt::Debug {
    /// Applies every write in `batch`, or none of them.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if an entity is not stored
    /// - `RepositoryError::VersionConflict` if an entity changed since it was loaded
    /// - Any backend failure; nothing is written in every error case
    async fn commit(&self, batch: WriteBatch) -> RepositoryResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod repository_error {
        use super::*;

        #[test]
        fn not_found_error() {
            let err = RepositoryError::not_found("Order", "order-123");
            assert!(err.is_not_found());
            assert!(!err.is_duplicate());
            assert!(!err.is_version_conflict());
            assert!(err.to_string().contains("not found"));
            assert!(err.to_string().contains("Order"));
            assert!(err.to_string().contains("order-123"));
        }

        #[test]
        fn duplicate_error() {
            let err = RepositoryError::duplicate("Negotiation", "neg-456");
            assert!(!err.is_not_found());
            assert!(err.is_duplicate());
            assert!(err.to_string().contains("Duplicate"));
            assert!(err.to_string().contains("Negotiation"));
        }

        #[test]
        fn version_conflict_error() {
            let err = RepositoryError::version_conflict("Order", "order-123", 1, 2);
            assert!(err.is_version_conflict());
            assert!(err.to_string().contains("conflict"));
        }

        #[test]
        fn connection_error() {
            let err = RepositoryError::connection("Connection refused");
            assert!(err.to_string().contains("Connection"));
            assert!(err.to_string().contains("refused"));
        }
    }

    mod counter_order_query {
        use super::*;
        use crate::domain::entities::order::NewOrderParams;
        use crate::domain::value_objects::{Location, PriceEvaluation, Price, Quantity};

        fn order(order_type: OrderType, grade: Grade, province: &str, district: &str) -> Order {
            Order::new(
                NewOrderParams {
                    owner: UserId::new("u"),
                    order_type,
                    location: Location::new(province, district).unwrap(),
                    grade,
                    quantity: Quantity::new(10.0).unwrap(),
                    requested_price: Price::new(10.0).unwrap(),
                },
                &PriceEvaluation::no_reference(),
            )
        }

        #[test]
        fn targets_opposite_type_in_province() {
            let source = order(OrderType::Sell, Grade::A, "P1", "D1");
            let query = CounterOrderQuery::for_source(&source, 5);
            assert_eq!(query.order_type, OrderType::Buy);
            assert_eq!(query.grade, Grade::A);
            assert_eq!(query.province, "P1");
            assert!(query.district.is_none());
            assert_eq!(query.limit, 5);
        }

        #[test]
        fn matches_filters_every_dimension() {
            let source = order(OrderType::Sell, Grade::A, "P1", "D1");
            let query = CounterOrderQuery::for_source(&source, 5).in_district("D1");

            assert!(query.matches(&order(OrderType::Buy, Grade::A, "P1", "D1")));
            assert!(!query.matches(&order(OrderType::Sell, Grade::A, "P1", "D1")));
            assert!(!query.matches(&order(OrderType::Buy, Grade::B, "P1", "D1")));
            assert!(!query.matches(&order(OrderType::Buy, Grade::A, "P2", "D1")));
            assert!(!query.matches(&order(OrderType::Buy, Grade::A, "P1", "D2")));

            let mut closed = order(OrderType::Buy, Grade::A, "P1", "D1");
            closed.close().unwrap();
            assert!(!query.matches(&closed));
        }
    }

    #[test]
    fn write_batch_keeps_insertion_order() {
        use crate::domain::entities::order::NewOrderParams;
        use crate::domain::value_objects::{Location, PriceEvaluation, Price, Quantity};

        let order = Order::new(
            NewOrderParams {
                owner: UserId::new("u"),
                order_type: OrderType::Sell,
                location: Location::new("P", "D").unwrap(),
                grade: Grade::A,
                quantity: Quantity::new(1.0).unwrap(),
                requested_price: Price::new(1.0).unwrap(),
            },
            &PriceEvaluation::no_reference(),
        );
        let batch = WriteBatch::new().update_order(order.clone());
        assert_eq!(batch.len(), 1);
        assert!(!batch.is_empty());
        assert_eq!(batch.writes()[0].entity_type(), "Order");
        assert_eq!(batch.writes()[0].entity_id(), order.id().to_string());
        assert_eq!(batch.writes()[0].expected_version(), 0);
        assert!(WriteBatch::new().is_empty());
    }
}
