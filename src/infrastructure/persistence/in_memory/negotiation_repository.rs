//! # In-Memory Negotiation Repository
//!
//! In-memory implementation of [`NegotiationRepository`] for testing.
//!
//! Inserting a second open negotiation for the same (order, farmer,
//! factory) triple is rejected as a duplicate, mirroring the partial unique
//! index of the PostgreSQL schema.

use crate::domain::entities::negotiation::Negotiation;
use crate::domain::value_objects::{NegotiationId, OrderId, Pagination, UserId};
use crate::infrastructure::persistence::in_memory::database::{
    SharedTables, Tables, next_version,
};
use crate::infrastructure::persistence::traits::{
    NegotiationRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use std::cmp::Reverse;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`NegotiationRepository`].
#[derive(Debug, Clone)]
pub struct InMemoryNegotiationRepository {
    tables: SharedTables,
}

impl InMemoryNegotiationRepository {
    /// Creates a new empty in-memory negotiation repository.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tables(Arc::new(RwLock::new(Tables::default())))
    }

    pub(crate) fn with_tables(tables: SharedTables) -> Self {
        Self { tables }
    }

    /// Returns the number of stored negotiations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables
            .try_read()
            .map(|guard| guard.negotiations.len())
            .unwrap_or(0)
    }

    /// Returns true if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn list_where<F>(&self, pagination: Pagination, filter: F) -> Vec<Negotiation>
    where
        F: Fn(&Negotiation) -> bool + Send,
    {
        let tables = self.tables.read().await;
        let mut found: Vec<Negotiation> = tables
            .negotiations
            .values()
            .filter(|n| filter(n))
            .cloned()
            .collect();
        found.sort_by_key(|n| (Reverse(n.updated_at()), n.id()));
        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        found
            .into_iter()
            .skip(offset)
            .take(pagination.limit())
            .collect()
    }
}

impl Default for InMemoryNegotiationRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn same_triple(a: &Negotiation, b: &Negotiation) -> bool {
    a.order_id() == b.order_id() && a.farmer_id() == b.farmer_id() && a.factory_id() == b.factory_id()
}

#[async_trait]
impl NegotiationRepository for InMemoryNegotiationRepository {
    async fn get(&self, id: &NegotiationId) -> RepositoryResult<Option<Negotiation>> {
        let tables = self.tables.read().await;
        Ok(tables.negotiations.get(id).cloned())
    }

    async fn insert(&self, negotiation: &Negotiation) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        let id = negotiation.id();
        if tables.negotiations.contains_key(&id) {
            return Err(RepositoryError::duplicate("Negotiation", id.to_string()));
        }
        if negotiation.is_open()
            && tables
                .negotiations
                .values()
                .any(|n| n.is_open() && same_triple(n, negotiation))
        {
            return Err(RepositoryError::duplicate(
                "Negotiation",
                format!(
                    "open negotiation for order {} between {} and {}",
                    negotiation.order_id(),
                    negotiation.farmer_id(),
                    negotiation.factory_id()
                ),
            ));
        }
        let mut stored = negotiation.clone();
        stored.set_version(0);
        tables.negotiations.insert(id, stored);
        Ok(())
    }

    async fn update(&self, negotiation: &Negotiation) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        let id = negotiation.id();
        let Some(current) = tables.negotiations.get(&id) else {
            return Err(RepositoryError::not_found("Negotiation", id.to_string()));
        };
        if current.version() != negotiation.version() {
            return Err(RepositoryError::version_conflict(
                "Negotiation",
                id.to_string(),
                negotiation.version(),
                current.version(),
            ));
        }
        let version = next_version("Negotiation", id.to_string(), current.version())?;
        let mut stored = negotiation.clone();
        stored.set_version(version);
        tables.negotiations.insert(id, stored);
        Ok(())
    }

    async fn find_latest_open(
        &self,
        order_id: &OrderId,
        farmer_id: &UserId,
        factory_id: &UserId,
    ) -> RepositoryResult<Option<Negotiation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .negotiations
            .values()
            .filter(|n| {
                n.is_open()
                    && &n.order_id() == order_id
                    && n.farmer_id() == farmer_id
                    && n.factory_id() == factory_id
            })
            .max_by_key(|n| n.updated_at())
            .cloned())
    }

    async fn list_by_order(
        &self,
        order_id: &OrderId,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Negotiation>> {
        let order_id = *order_id;
        Ok(self
            .list_where(pagination, move |n| n.order_id() == order_id)
            .await)
    }

    async fn list_by_farmer(
        &self,
        farmer_id: &UserId,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Negotiation>> {
        Ok(self
            .list_where(pagination, |n| n.farmer_id() == farmer_id)
            .await)
    }

    async fn list_by_factory(
        &self,
        factory_id: &UserId,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Negotiation>> {
        Ok(self
            .list_where(pagination, |n| n.factory_id() == factory_id)
            .await)
    }
}
