//! # In-Memory Order Repository
//!
//! In-memory implementation of [`OrderRepository`] for testing.

use crate::domain::entities::order::Order;
use crate::domain::value_objects::{OrderId, Pagination, UserId};
use crate::infrastructure::persistence::in_memory::database::{SharedTables, Tables};
use crate::infrastructure::persistence::traits::{
    CounterOrderQuery, OrderRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use std::cmp::Reverse;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`OrderRepository`].
///
/// Standalone instances own their tables; instances obtained from
/// [`InMemoryDatabase::orders`](super::InMemoryDatabase::orders) share them.
#[derive(Debug, Clone)]
pub struct InMemoryOrderRepository {
    tables: SharedTables,
}

impl InMemoryOrderRepository {
    /// Creates a new empty in-memory order repository.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tables(Arc::new(RwLock::new(Tables::default())))
    }

    pub(crate) fn with_tables(tables: SharedTables) -> Self {
        Self { tables }
    }

    /// Returns the number of stored orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables
            .try_read()
            .map(|guard| guard.orders.len())
            .unwrap_or(0)
    }

    /// Returns true if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by_key(|o| (Reverse(o.created_at()), o.id()));
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn get(&self, id: &OrderId) -> RepositoryResult<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(id).cloned())
    }

    async fn exists(&self, id: &OrderId) -> RepositoryResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.orders.contains_key(id))
    }

    async fn insert(&self, order: &Order) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        if tables.orders.contains_key(&order.id()) {
            return Err(RepositoryError::duplicate("Order", order.id().to_string()));
        }
        let mut stored = order.clone();
        stored.set_version(0);
        tables.orders.insert(stored.id(), stored);
        Ok(())
    }

    async fn find_open_counter_orders(
        &self,
        query: &CounterOrderQuery,
    ) -> RepositoryResult<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();
        newest_first(&mut found);
        found.truncate(query.limit);
        Ok(found)
    }

    async fn list_by_owner(
        &self,
        owner: &UserId,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut owned: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| o.owner() == owner)
            .cloned()
            .collect();
        newest_first(&mut owned);
        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        Ok(owned
            .into_iter()
            .skip(offset)
            .take(pagination.limit())
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::order::NewOrderParams;
    use crate::domain::value_objects::{
        Grade, Location, OrderType, Price, PriceEvaluation, Quantity,
    };

    fn order(owner: &str, order_type: OrderType, district: &str) -> Order {
        Order::new(
            NewOrderParams {
                owner: UserId::new(owner),
                order_type,
                location: Location::new("P1", district).unwrap(),
                grade: Grade::A,
                quantity: Quantity::new(100.0).unwrap(),
                requested_price: Price::new(20.0).unwrap(),
            },
            &PriceEvaluation::no_reference(),
        )
    }

    #[tokio::test]
    async fn new_repository_is_empty() {
        let repo = InMemoryOrderRepository::new();
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn insert_and_get() {
        let repo = InMemoryOrderRepository::new();
        let o = order("u1", OrderType::Sell, "D1");
        repo.insert(&o).await.unwrap();

        assert_eq!(repo.len(), 1);
        assert!(repo.exists(&o.id()).await.unwrap());
        assert_eq!(repo.get(&o.id()).await.unwrap(), Some(o));
    }

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let repo = InMemoryOrderRepository::new();
        assert!(repo.get(&OrderId::new_v4()).await.unwrap().is_none());
        assert!(!repo.exists(&OrderId::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_insert_fails() {
        let repo = InMemoryOrderRepository::new();
        let o = order("u1", OrderType::Sell, "D1");
        repo.insert(&o).await.unwrap();
        assert!(repo.insert(&o).await.unwrap_err().is_duplicate());
    }

    #[tokio::test]
    async fn counter_orders_respect_filter_order_and_limit() {
        let repo = InMemoryOrderRepository::new();
        let source = order("seller", OrderType::Sell, "D1");
        let older = order("buyer-1", OrderType::Buy, "D1");
        let newer = order("buyer-2", OrderType::Buy, "D2");
        let same_side = order("seller-2", OrderType::Sell, "D1");
        for o in [&source, &older, &newer, &same_side] {
            repo.insert(o).await.unwrap();
        }

        let query = CounterOrderQuery::for_source(&source, 10);
        let found = repo.find_open_counter_orders(&query).await.unwrap();
        let ids: Vec<_> = found.iter().map(Order::id).collect();
        assert_eq!(ids, vec![newer.id(), older.id()]);

        let in_d1 = repo
            .find_open_counter_orders(&query.clone().in_district("D1"))
            .await
            .unwrap();
        assert_eq!(in_d1.len(), 1);
        assert_eq!(in_d1[0].id(), older.id());

        let capped = CounterOrderQuery { limit: 1, ..query };
        assert_eq!(repo.find_open_counter_orders(&capped).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_by_owner_paginates_newest_first() {
        let repo = InMemoryOrderRepository::new();
        let mut placed = Vec::new();
        for _ in 0..3 {
            let o = order("u1", OrderType::Sell, "D1");
            repo.insert(&o).await.unwrap();
            placed.push(o);
        }
        repo.insert(&order("u2", OrderType::Sell, "D1")).await.unwrap();

        let first = repo
            .list_by_owner(&UserId::new("u1"), Pagination::new(1, 2).unwrap())
            .await
            .unwrap();
        let second = repo
            .list_by_owner(&UserId::new("u1"), Pagination::new(2, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert!(first[0].created_at() >= first[1].created_at());
        assert!(first[1].created_at() >= second[0].created_at());
    }
}
