//! # In-Memory Database
//!
//! Shared table storage behind the in-memory repositories and the
//! in-memory [`UnitOfWork`].
//!
//! All repositories handed out by one [`InMemoryDatabase`] see the same
//! tables, so a batch committed through the database is visible to every
//! repository immediately.

use crate::domain::entities::negotiation::Negotiation;
use crate::domain::entities::order::Order;
use crate::domain::value_objects::{NegotiationId, OrderId, ReferencePrice, ReferencePriceId};
use crate::infrastructure::persistence::in_memory::{
    InMemoryNegotiationRepository, InMemoryOrderRepository, InMemoryReferencePriceRepository,
};
use crate::infrastructure::persistence::traits::{
    RepositoryError, RepositoryResult, UnitOfWork, Write, WriteBatch,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Backing tables shared by the in-memory repositories.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) orders: HashMap<OrderId, Order>,
    pub(crate) negotiations: HashMap<NegotiationId, Negotiation>,
    pub(crate) reference_prices: HashMap<ReferencePriceId, ReferencePrice>,
}

pub(crate) type SharedTables = Arc<RwLock<Tables>>;

/// Stored version after one successful write.
pub(crate) fn next_version(entity_type: &'static str, id: String, current: u64) -> RepositoryResult<u64> {
    current
        .checked_add(1)
        .ok_or_else(|| RepositoryError::internal(format!("{entity_type} {id} version overflow")))
}

/// In-memory store with atomic multi-entity commits.
///
/// # Fault Injection
///
/// [`fail_next_commit`](Self::fail_next_commit) makes the next
/// [`UnitOfWork::commit`] fail after validation and before anything is
/// applied, simulating a crash between the two writes of an acceptance.
///
/// # Examples
///
/// ```
/// use produce_market::infrastructure::persistence::in_memory::InMemoryDatabase;
///
/// let db = InMemoryDatabase::new();
/// let orders = db.orders();
/// let negotiations = db.negotiations();
/// # let _ = (orders, negotiations);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: SharedTables,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryDatabase {
    /// Creates a new empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an order repository over this database.
    #[must_use]
    pub fn orders(&self) -> InMemoryOrderRepository {
        InMemoryOrderRepository::with_tables(Arc::clone(&self.tables))
    }

    /// Returns a negotiation repository over this database.
    #[must_use]
    pub fn negotiations(&self) -> InMemoryNegotiationRepository {
        InMemoryNegotiationRepository::with_tables(Arc::clone(&self.tables))
    }

    /// Returns a reference price repository over this database.
    #[must_use]
    pub fn reference_prices(&self) -> InMemoryReferencePriceRepository {
        InMemoryReferencePriceRepository::with_tables(Arc::clone(&self.tables))
    }

    /// Makes the next commit fail without applying any write.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        tables.orders.clear();
        tables.negotiations.clear();
        tables.reference_prices.clear();
    }
}

fn check_version(tables: &Tables, write: &Write) -> RepositoryResult<u64> {
    let stored = match write {
        Write::Order(order) => tables.orders.get(&order.id()).map(Order::version),
        Write::Negotiation(negotiation) => tables
            .negotiations
            .get(&negotiation.id())
            .map(Negotiation::version),
    };
    let Some(stored) = stored else {
        return Err(RepositoryError::not_found(
            write.entity_type(),
            write.entity_id(),
        ));
    };
    let expected = write.expected_version();
    if stored != expected {
        return Err(RepositoryError::version_conflict(
            write.entity_type(),
            write.entity_id(),
            expected,
            stored,
        ));
    }
    next_version(write.entity_type(), write.entity_id(), stored)
}

#[async_trait]
impl UnitOfWork for InMemoryDatabase {
    async fn commit(&self, batch: WriteBatch) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;

        let mut staged = Vec::with_capacity(batch.len());
        for write in batch {
            let version = check_version(&tables, &write)?;
            staged.push((write, version));
        }

        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(RepositoryError::connection(
                "injected failure before commit",
            ));
        }

        for (write, version) in staged {
            match write {
                Write::Order(mut order) => {
                    order.set_version(version);
                    tables.orders.insert(order.id(), order);
                }
                Write::Negotiation(mut negotiation) => {
                    negotiation.set_version(version);
                    tables.negotiations.insert(negotiation.id(), negotiation);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::negotiation::Offer;
    use crate::domain::entities::order::NewOrderParams;
    use crate::domain::value_objects::{
        Grade, Location, OrderStatus, OrderType, Price, PriceEvaluation, Quantity, Side, Timestamp,
        UserId,
    };
    use crate::infrastructure::persistence::traits::{NegotiationRepository, OrderRepository};

    async fn seeded() -> (InMemoryDatabase, Order, Negotiation) {
        let db = InMemoryDatabase::new();
        let order = Order::new(
            NewOrderParams {
                owner: UserId::new("farmer"),
                order_type: OrderType::Sell,
                location: Location::new("P1", "D1").unwrap(),
                grade: Grade::A,
                quantity: Quantity::new(100.0).unwrap(),
                requested_price: Price::new(20.0).unwrap(),
            },
            &PriceEvaluation::no_reference(),
        );
        let negotiation = Negotiation::open(
            &order,
            UserId::new("farmer"),
            UserId::new("factory"),
            Offer::new(
                Side::Factory,
                Price::new(19.0).unwrap(),
                Quantity::new(100.0).unwrap(),
            ),
        )
        .unwrap();
        db.orders().insert(&order).await.unwrap();
        db.negotiations().insert(&negotiation).await.unwrap();
        (db, order, negotiation)
    }

    fn accepted(order: &Order, negotiation: &Negotiation) -> (Order, Negotiation) {
        let mut negotiation = negotiation.clone();
        negotiation.accept().unwrap();
        let mut order = order.clone();
        order
            .mark_matched(negotiation.offered_price(), Timestamp::now())
            .unwrap();
        (order, negotiation)
    }

    #[tokio::test]
    async fn commit_applies_every_write_and_bumps_versions() {
        let (db, order, negotiation) = seeded().await;
        let (order, negotiation) = accepted(&order, &negotiation);

        db.commit(
            WriteBatch::new()
                .update_negotiation(negotiation.clone())
                .update_order(order.clone()),
        )
        .await
        .unwrap();

        let stored_order = db.orders().get(&order.id()).await.unwrap().unwrap();
        let stored_neg = db
            .negotiations()
            .get(&negotiation.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_order.status(), OrderStatus::Matched);
        assert_eq!(stored_order.version(), 1);
        assert_eq!(stored_neg.version(), 1);
    }

    #[tokio::test]
    async fn injected_failure_writes_nothing() {
        let (db, order, negotiation) = seeded().await;
        let (matched, accepted_neg) = accepted(&order, &negotiation);

        db.fail_next_commit();
        let result = db
            .commit(
                WriteBatch::new()
                    .update_negotiation(accepted_neg)
                    .update_order(matched),
            )
            .await;
        assert!(matches!(result, Err(RepositoryError::Connection(_))));

        assert_eq!(db.orders().get(&order.id()).await.unwrap().unwrap(), order);
        assert_eq!(
            db.negotiations()
                .get(&negotiation.id())
                .await
                .unwrap()
                .unwrap(),
            negotiation
        );
    }

    #[tokio::test]
    async fn failure_is_one_shot() {
        let (db, order, negotiation) = seeded().await;
        let (matched, accepted_neg) = accepted(&order, &negotiation);
        db.fail_next_commit();
        let batch = WriteBatch::new()
            .update_negotiation(accepted_neg)
            .update_order(matched);
        assert!(db.commit(batch.clone()).await.is_err());
        assert!(db.commit(batch).await.is_ok());
    }

    #[tokio::test]
    async fn stale_version_in_second_write_leaves_first_untouched() {
        let (db, order, negotiation) = seeded().await;
        let (matched, accepted_neg) = accepted(&order, &negotiation);

        let mut bumped = negotiation.clone();
        bumped
            .submit_offer(Offer::new(
                Side::Farmer,
                Price::new(19.5).unwrap(),
                Quantity::new(100.0).unwrap(),
            ))
            .unwrap();
        db.negotiations().update(&bumped).await.unwrap();

        let result = db
            .commit(
                WriteBatch::new()
                    .update_order(matched)
                    .update_negotiation(accepted_neg),
            )
            .await;
        assert!(result.unwrap_err().is_version_conflict());
        let stored_order = db.orders().get(&order.id()).await.unwrap().unwrap();
        assert_eq!(stored_order.status(), OrderStatus::Open);
        assert_eq!(stored_order.version(), 0);
    }

    #[tokio::test]
    async fn missing_entity_is_not_found() {
        let db = InMemoryDatabase::new();
        let (_, order, _) = seeded().await;
        let result = db.commit(WriteBatch::new().update_order(order)).await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn clear_empties_all_tables() {
        let (db, order, _) = seeded().await;
        db.clear().await;
        assert!(!db.orders().exists(&order.id()).await.unwrap());
    }
}
