//! # Negotiation Engine
//!
//! Drives two-party negotiations over orders.
//!
//! # Flow
//!
//! ```text
//! create_or_update_negotiation
//!   resolve roles -> order must be open -> lock (order, farmer, factory)
//!   -> no open thread: open one      -> insert
//!   -> open thread:    merge offer   -> versioned update
//!
//! update_negotiation_status
//!   load -> must be open -> actor must be a party -> transition
//!   -> accepted: negotiation + order(matched) in one WriteBatch
//!   -> otherwise: versioned update
//! ```
//!
//! # Concurrency
//!
//! Counter-offers for one (order, farmer, factory) triple are serialised by
//! an in-process async lock, so concurrent first rounds in the same engine
//! produce one negotiation. Writers in other processes are caught by the
//! version check on merge and by the store's uniqueness rule on insert.

use crate::application::dto::{CounterOffer, StatusUpdate};
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::entities::negotiation::{Negotiation, Offer};
use crate::domain::entities::order::Order;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::arithmetic::CheckedArithmetic;
use crate::domain::value_objects::pagination::DEFAULT_PAGE_SIZE;
use crate::domain::value_objects::{
    NegotiationId, NegotiationStatus, OrderId, OrderType, Pagination, Side, UserId,
};
use crate::infrastructure::persistence::{
    NegotiationRepository, OrderRepository, RepositoryError, UnitOfWork, WriteBatch,
};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Role an actor plays with respect to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorRole {
    /// The actor is the farmer side.
    Farmer,
    /// The actor is the factory side.
    Factory,
    /// The actor is neither side.
    Unrelated,
}

impl ActorRole {
    /// Determines the role of `actor` given both parties.
    #[must_use]
    pub fn of(actor: &UserId, farmer: &UserId, factory: &UserId) -> Self {
        if actor == farmer {
            Self::Farmer
        } else if actor == factory {
            Self::Factory
        } else {
            Self::Unrelated
        }
    }

    /// Returns the negotiation side for a related actor.
    #[must_use]
    pub const fn side(self) -> Option<Side> {
        match self {
            Self::Farmer => Some(Side::Farmer),
            Self::Factory => Some(Side::Factory),
            Self::Unrelated => None,
        }
    }
}

/// The parties of a prospective negotiation over an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoles {
    /// The order, as loaded.
    pub order: Order,
    /// The farmer side.
    pub farmer: UserId,
    /// The factory side.
    pub factory: UserId,
    /// The acting account's role.
    pub actor_role: ActorRole,
}

type TripleKey = (OrderId, UserId, UserId);

fn bump(version: u64) -> ApplicationResult<u64> {
    Ok(version.safe_add(1).map_err(DomainError::from)?)
}

/// Service driving negotiations through their lifecycle.
#[derive(Debug, Clone)]
pub struct NegotiationEngine {
    orders: Arc<dyn OrderRepository>,
    negotiations: Arc<dyn NegotiationRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
    locks: Arc<DashMap<TripleKey, Arc<Mutex<()>>>>,
    page_size: u32,
}

impl NegotiationEngine {
    /// Creates a new engine.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        negotiations: Arc<dyn NegotiationRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            orders,
            negotiations,
            unit_of_work,
            locks: Arc::new(DashMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the page size used when a listing gives no pagination.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    fn default_page(&self) -> ApplicationResult<Pagination> {
        Ok(Pagination::new(1, self.page_size)?)
    }

    /// Works out who the farmer and factory would be if `actor` negotiated
    /// on `order_id`.
    ///
    /// A sell order's owner is the farmer and the actor the factory; a buy
    /// order's owner is the factory and the actor the farmer.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::OrderNotFound` if the order does not exist
    /// - `ApplicationError::ActorNotRelatedToOrder` if the actor owns the
    ///   order (both parties would be the same account) or plays no role
    pub async fn resolve_roles(
        &self,
        order_id: &OrderId,
        actor: &UserId,
    ) -> ApplicationResult<ResolvedRoles> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(ApplicationError::OrderNotFound(*order_id))?;

        let (farmer, factory) = match order.order_type() {
            OrderType::Sell => (order.owner().clone(), actor.clone()),
            OrderType::Buy => (actor.clone(), order.owner().clone()),
        };
        let actor_role = ActorRole::of(actor, &farmer, &factory);
        if farmer == factory || actor_role == ActorRole::Unrelated {
            return Err(ApplicationError::ActorNotRelatedToOrder {
                order_id: *order_id,
                actor: actor.clone(),
            });
        }

        Ok(ResolvedRoles {
            order,
            farmer,
            factory,
            actor_role,
        })
    }

    fn lock_for(&self, key: &TripleKey) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    fn release_lock(&self, key: &TripleKey) {
        self.locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Opens a negotiation for the triple, or merges a new round into the
    /// open one.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::OrderNotFound` / `ActorNotRelatedToOrder` from role resolution
    /// - `ApplicationError::OrderNotOpen` if the order is no longer open
    /// - `ApplicationError::Domain` for a non-positive price or amount
    /// - `ApplicationError::Repository` on store failure or a lost race
    pub async fn create_or_update_negotiation(
        &self,
        request: CounterOffer,
    ) -> ApplicationResult<Negotiation> {
        let roles = self.resolve_roles(&request.order_id, &request.actor).await?;
        if !roles.order.is_open() {
            return Err(ApplicationError::OrderNotOpen {
                order_id: roles.order.id(),
                status: roles.order.status(),
            });
        }
        let side = roles
            .actor_role
            .side()
            .ok_or_else(|| ApplicationError::ActorNotRelatedToOrder {
                order_id: request.order_id,
                actor: request.actor.clone(),
            })?;
        let offer = request.to_offer(side)?;

        let key = (roles.order.id(), roles.farmer.clone(), roles.factory.clone());
        let lock = self.lock_for(&key);
        let result = {
            let _guard = lock.lock().await;
            self.open_or_merge(roles, offer).await
        };
        drop(lock);
        self.release_lock(&key);
        result
    }

    async fn open_or_merge(
        &self,
        roles: ResolvedRoles,
        offer: Offer,
    ) -> ApplicationResult<Negotiation> {
        let existing = self
            .negotiations
            .find_latest_open(&roles.order.id(), &roles.farmer, &roles.factory)
            .await?;

        match existing {
            None => {
                let negotiation = Negotiation::open(&roles.order, roles.farmer, roles.factory, offer)?;
                self.negotiations.insert(&negotiation).await?;
                info!(
                    negotiation_id = %negotiation.id(),
                    order_id = %negotiation.order_id(),
                    side = %negotiation.last_side(),
                    offered_price = %negotiation.offered_price(),
                    "negotiation opened"
                );
                Ok(negotiation)
            }
            Some(mut negotiation) => {
                negotiation.submit_offer(offer)?;
                if let Err(err) = self.negotiations.update(&negotiation).await {
                    if err.is_version_conflict() {
                        warn!(
                            negotiation_id = %negotiation.id(),
                            error = %err,
                            "negotiation changed concurrently"
                        );
                    }
                    return Err(err.into());
                }
                negotiation.set_version(bump(negotiation.version())?);
                info!(
                    negotiation_id = %negotiation.id(),
                    order_id = %negotiation.order_id(),
                    side = %negotiation.last_side(),
                    offered_price = %negotiation.offered_price(),
                    round = negotiation.round_count(),
                    "negotiation round merged"
                );
                Ok(negotiation)
            }
        }
    }

    /// Moves an open negotiation to `accepted`, `rejected` or `cancelled`.
    ///
    /// Acceptance also marks the order matched at the accepted price; both
    /// writes commit together or not at all.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::NegotiationNotFound` if the negotiation does not exist
    /// - `ApplicationError::NegotiationNotOpen` if it is already terminal
    /// - `ApplicationError::ActorNotInNegotiation` if the actor is not a party
    /// - `ApplicationError::Validation` if the requested status is `open`
    /// - `ApplicationError::OrderNotOpen` if accepting on an order that is no longer open
    /// - `ApplicationError::Repository` on store failure or a lost race
    pub async fn update_negotiation_status(
        &self,
        request: StatusUpdate,
    ) -> ApplicationResult<Negotiation> {
        let id = request.negotiation_id;
        let mut negotiation = self
            .negotiations
            .get(&id)
            .await?
            .ok_or(ApplicationError::NegotiationNotFound(id))?;

        if !negotiation.is_open() {
            warn!(
                negotiation_id = %id,
                status = %negotiation.status(),
                requested = %request.status,
                "status change on closed negotiation"
            );
            return Err(ApplicationError::NegotiationNotOpen {
                negotiation_id: id,
                status: negotiation.status(),
            });
        }
        if negotiation.side_of(&request.actor).is_none() {
            return Err(ApplicationError::ActorNotInNegotiation {
                negotiation_id: id,
                actor: request.actor,
            });
        }
        if request.status == NegotiationStatus::Open {
            return Err(ApplicationError::validation(
                "status must be accepted, rejected or cancelled",
            ));
        }

        negotiation.transition_to(request.status)?;

        if request.status == NegotiationStatus::Accepted {
            self.accept(negotiation).await
        } else {
            self.negotiations.update(&negotiation).await?;
            negotiation.set_version(bump(negotiation.version())?);
            info!(
                negotiation_id = %negotiation.id(),
                order_id = %negotiation.order_id(),
                status = %negotiation.status(),
                "negotiation status updated"
            );
            Ok(negotiation)
        }
    }

    async fn accept(&self, mut negotiation: Negotiation) -> ApplicationResult<Negotiation> {
        let order_id = negotiation.order_id();
        let mut order = self
            .orders
            .get(&order_id)
            .await?
            .ok_or(ApplicationError::OrderNotFound(order_id))?;
        if !order.is_open() {
            warn!(
                negotiation_id = %negotiation.id(),
                %order_id,
                order_status = %order.status(),
                "acceptance on order that is no longer open"
            );
            return Err(ApplicationError::OrderNotOpen {
                order_id,
                status: order.status(),
            });
        }

        let final_price = negotiation.offered_price();
        order.mark_matched(final_price, negotiation.updated_at())?;

        let batch = WriteBatch::new()
            .update_negotiation(negotiation.clone())
            .update_order(order.clone());
        if let Err(err) = self.unit_of_work.commit(batch).await {
            log_commit_failure(&negotiation, &err);
            return Err(err.into());
        }
        negotiation.set_version(bump(negotiation.version())?);

        info!(
            negotiation_id = %negotiation.id(),
            %order_id,
            status = %negotiation.status(),
            %final_price,
            "negotiation accepted, order matched"
        );
        Ok(negotiation)
    }

    /// Lists negotiations on an order, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Repository` if the lookup fails.
    pub async fn list_negotiations_by_order(
        &self,
        order_id: &OrderId,
        pagination: Option<Pagination>,
    ) -> ApplicationResult<Vec<Negotiation>> {
        let page = pagination.map_or_else(|| self.default_page(), Ok)?;
        debug!(%order_id, page = page.page(), "listing negotiations by order");
        Ok(self.negotiations.list_by_order(order_id, page).await?)
    }

    /// Lists negotiations where `farmer_id` is the farmer, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Repository` if the lookup fails.
    pub async fn list_negotiations_by_farmer(
        &self,
        farmer_id: &UserId,
        pagination: Option<Pagination>,
    ) -> ApplicationResult<Vec<Negotiation>> {
        let page = pagination.map_or_else(|| self.default_page(), Ok)?;
        debug!(%farmer_id, page = page.page(), "listing negotiations by farmer");
        Ok(self.negotiations.list_by_farmer(farmer_id, page).await?)
    }

    /// Lists negotiations where `factory_id` is the factory, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Repository` if the lookup fails.
    pub async fn list_negotiations_by_factory(
        &self,
        factory_id: &UserId,
        pagination: Option<Pagination>,
    ) -> ApplicationResult<Vec<Negotiation>> {
        let page = pagination.map_or_else(|| self.default_page(), Ok)?;
        debug!(%factory_id, page = page.page(), "listing negotiations by factory");
        Ok(self.negotiations.list_by_factory(factory_id, page).await?)
    }

    /// Returns a negotiation by ID.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::NegotiationNotFound` if it does not exist
    /// - `ApplicationError::Repository` if the lookup fails
    pub async fn get_negotiation(&self, id: &NegotiationId) -> ApplicationResult<Negotiation> {
        self.negotiations
            .get(id)
            .await?
            .ok_or(ApplicationError::NegotiationNotFound(*id))
    }
}

fn log_commit_failure(negotiation: &Negotiation, err: &RepositoryError) {
    warn!(
        negotiation_id = %negotiation.id(),
        order_id = %negotiation.order_id(),
        error = %err,
        "acceptance not committed"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::application::dto::CounterOffer;
    use crate::domain::entities::order::NewOrderParams;
    use crate::domain::value_objects::{
        Grade, Location, OrderStatus, Price, PriceEvaluation, PriceStatus, Quantity,
    };
    use crate::infrastructure::persistence::in_memory::InMemoryDatabase;
    use rust_decimal::Decimal;

    struct Fixture {
        db: InMemoryDatabase,
        engine: NegotiationEngine,
    }

    fn fixture() -> Fixture {
        let db = InMemoryDatabase::new();
        let engine = NegotiationEngine::new(
            Arc::new(db.orders()),
            Arc::new(db.negotiations()),
            Arc::new(db.clone()),
        );
        Fixture { db, engine }
    }

    async fn place(db: &InMemoryDatabase, owner: &str, order_type: OrderType) -> Order {
        let order = Order::new(
            NewOrderParams {
                owner: UserId::new(owner),
                order_type,
                location: Location::new("P1", "D1").unwrap(),
                grade: Grade::A,
                quantity: Quantity::new(1000.0).unwrap(),
                requested_price: Price::new(20.0).unwrap(),
            },
            &PriceEvaluation::no_reference(),
        );
        db.orders().insert(&order).await.unwrap();
        order
    }

    fn offer(order: &Order, actor: &str, price: i64) -> CounterOffer {
        CounterOffer {
            order_id: order.id(),
            actor: UserId::new(actor),
            offered_price: Decimal::from(price),
            amount_kg: Decimal::from(500),
            ref_avg_price: None,
            price_status: None,
        }
    }

    fn status(negotiation: &Negotiation, actor: &str, status: NegotiationStatus) -> StatusUpdate {
        StatusUpdate {
            negotiation_id: negotiation.id(),
            actor: UserId::new(actor),
            status,
        }
    }

    mod roles {
        use super::*;

        #[tokio::test]
        async fn sell_order_owner_is_farmer() {
            let f = fixture();
            let order = place(&f.db, "farmer", OrderType::Sell).await;
            let roles = f
                .engine
                .resolve_roles(&order.id(), &UserId::new("factory"))
                .await
                .unwrap();
            assert_eq!(roles.farmer, UserId::new("farmer"));
            assert_eq!(roles.factory, UserId::new("factory"));
            assert_eq!(roles.actor_role, ActorRole::Factory);
        }

        #[tokio::test]
        async fn buy_order_owner_is_factory() {
            let f = fixture();
            let order = place(&f.db, "factory", OrderType::Buy).await;
            let roles = f
                .engine
                .resolve_roles(&order.id(), &UserId::new("farmer"))
                .await
                .unwrap();
            assert_eq!(roles.farmer, UserId::new("farmer"));
            assert_eq!(roles.factory, UserId::new("factory"));
            assert_eq!(roles.actor_role, ActorRole::Farmer);
        }

        #[tokio::test]
        async fn owner_cannot_negotiate_with_self() {
            let f = fixture();
            let order = place(&f.db, "farmer", OrderType::Sell).await;
            let err = f
                .engine
                .resolve_roles(&order.id(), &UserId::new("farmer"))
                .await
                .unwrap_err();
            assert_eq!(err.code(), "actor_not_related_to_order");
        }

        #[tokio::test]
        async fn missing_order() {
            let f = fixture();
            let err = f
                .engine
                .resolve_roles(&OrderId::new_v4(), &UserId::new("x"))
                .await
                .unwrap_err();
            assert_eq!(err.code(), "order_not_found");
        }

        #[test]
        fn actor_role_of() {
            let farmer = UserId::new("a");
            let factory = UserId::new("b");
            assert_eq!(ActorRole::of(&farmer, &farmer, &factory), ActorRole::Farmer);
            assert_eq!(ActorRole::of(&factory, &farmer, &factory), ActorRole::Factory);
            assert_eq!(
                ActorRole::of(&UserId::new("c"), &farmer, &factory),
                ActorRole::Unrelated
            );
            assert_eq!(ActorRole::Unrelated.side(), None);
        }
    }

    mod counter_offers {
        use super::*;

        #[tokio::test]
        async fn second_round_merges_into_same_negotiation() {
            let f = fixture();
            let order = place(&f.db, "farmer", OrderType::Sell).await;

            let first = f
                .engine
                .create_or_update_negotiation(offer(&order, "factory", 18))
                .await
                .unwrap();
            let second = f
                .engine
                .create_or_update_negotiation(offer(&order, "factory", 19))
                .await
                .unwrap();

            assert_eq!(first.id(), second.id());
            assert_eq!(second.offered_price(), Price::new(19.0).unwrap());
            assert_eq!(second.last_side(), Side::Factory);
            assert_eq!(second.round_count(), 2);
            assert_eq!(second.version(), 1);
            assert_eq!(f.db.negotiations().len(), 1);
        }

        #[tokio::test]
        async fn owner_side_reply_goes_to_the_factory_thread() {
            let f = fixture();
            let order = place(&f.db, "factory", OrderType::Buy).await;
            let opened = f
                .engine
                .create_or_update_negotiation(offer(&order, "farmer", 25))
                .await
                .unwrap();
            assert_eq!(opened.last_side(), Side::Farmer);
            assert_eq!(opened.farmer_id(), &UserId::new("farmer"));
            assert_eq!(opened.factory_id(), &UserId::new("factory"));
        }

        #[tokio::test]
        async fn supplied_reference_overrides_snapshot() {
            let f = fixture();
            let order = place(&f.db, "farmer", OrderType::Sell).await;
            let mut request = offer(&order, "factory", 18);
            request.ref_avg_price = Some(Decimal::from(21));
            request.price_status = Some(PriceStatus::Normal);
            let n = f.engine.create_or_update_negotiation(request).await.unwrap();
            assert_eq!(n.ref_avg_price(), Some(Price::new(21.0).unwrap()));
            assert_eq!(n.price_status(), PriceStatus::Normal);
        }

        #[tokio::test]
        async fn closed_order_rejects_offers() {
            let f = fixture();
            let order = place(&f.db, "farmer", OrderType::Sell).await;
            let n = f
                .engine
                .create_or_update_negotiation(offer(&order, "factory", 18))
                .await
                .unwrap();
            f.engine
                .update_negotiation_status(status(&n, "farmer", NegotiationStatus::Accepted))
                .await
                .unwrap();

            let err = f
                .engine
                .create_or_update_negotiation(offer(&order, "other-factory", 18))
                .await
                .unwrap_err();
            assert_eq!(err.code(), "order_not_open");
        }

        #[tokio::test]
        async fn invalid_price_is_validation_error() {
            let f = fixture();
            let order = place(&f.db, "farmer", OrderType::Sell).await;
            let err = f
                .engine
                .create_or_update_negotiation(offer(&order, "factory", 0))
                .await
                .unwrap_err();
            assert!(err.is_validation());
            assert!(f.db.negotiations().is_empty());
        }

        #[tokio::test]
        async fn concurrent_first_rounds_share_one_negotiation() {
            let f = fixture();
            let order = place(&f.db, "farmer", OrderType::Sell).await;

            let mut handles = Vec::new();
            for price in 10..20 {
                let engine = f.engine.clone();
                let request = offer(&order, "factory", price);
                handles.push(tokio::spawn(async move {
                    engine.create_or_update_negotiation(request).await
                }));
            }
            let mut ids = Vec::new();
            for handle in handles {
                ids.push(handle.await.unwrap().unwrap().id());
            }

            ids.dedup();
            assert_eq!(ids.len(), 1);
            assert_eq!(f.db.negotiations().len(), 1);
            let stored = f.engine.get_negotiation(&ids[0]).await.unwrap();
            assert_eq!(stored.round_count(), 10);
            assert!(f.engine.locks.is_empty());
        }
    }

    mod status_updates {
        use super::*;

        async fn opened(f: &Fixture) -> (Order, Negotiation) {
            let order = place(&f.db, "farmer", OrderType::Sell).await;
            let n = f
                .engine
                .create_or_update_negotiation(offer(&order, "factory", 18))
                .await
                .unwrap();
            (order, n)
        }

        #[tokio::test]
        async fn accept_matches_order() {
            let f = fixture();
            let (order, n) = opened(&f).await;

            let accepted = f
                .engine
                .update_negotiation_status(status(&n, "farmer", NegotiationStatus::Accepted))
                .await
                .unwrap();
            assert_eq!(accepted.status(), NegotiationStatus::Accepted);
            assert_eq!(accepted.final_price(), Some(Price::new(18.0).unwrap()));

            let stored = f.db.orders().get(&order.id()).await.unwrap().unwrap();
            assert_eq!(stored.status(), OrderStatus::Matched);
            assert_eq!(stored.final_price(), Some(Price::new(18.0).unwrap()));
            assert!(stored.matched_at().is_some());
        }

        #[tokio::test]
        async fn reject_leaves_order_open() {
            let f = fixture();
            let (order, n) = opened(&f).await;
            let rejected = f
                .engine
                .update_negotiation_status(status(&n, "factory", NegotiationStatus::Rejected))
                .await
                .unwrap();
            assert_eq!(rejected.status(), NegotiationStatus::Rejected);
            assert!(rejected.final_price().is_none());
            assert!(f.db.orders().get(&order.id()).await.unwrap().unwrap().is_open());
        }

        #[tokio::test]
        async fn second_update_fails_not_open() {
            let f = fixture();
            let (_, n) = opened(&f).await;
            f.engine
                .update_negotiation_status(status(&n, "farmer", NegotiationStatus::Cancelled))
                .await
                .unwrap();
            for target in [
                NegotiationStatus::Accepted,
                NegotiationStatus::Rejected,
                NegotiationStatus::Open,
            ] {
                let err = f
                    .engine
                    .update_negotiation_status(status(&n, "farmer", target))
                    .await
                    .unwrap_err();
                assert_eq!(err.code(), "negotiation_not_open");
            }
        }

        #[tokio::test]
        async fn outsider_cannot_update() {
            let f = fixture();
            let (_, n) = opened(&f).await;
            let err = f
                .engine
                .update_negotiation_status(status(&n, "stranger", NegotiationStatus::Rejected))
                .await
                .unwrap_err();
            assert_eq!(err.code(), "actor_not_in_negotiation");
        }

        #[tokio::test]
        async fn open_target_is_validation_error() {
            let f = fixture();
            let (_, n) = opened(&f).await;
            let err = f
                .engine
                .update_negotiation_status(status(&n, "farmer", NegotiationStatus::Open))
                .await
                .unwrap_err();
            assert!(err.is_validation());
        }

        #[tokio::test]
        async fn unknown_negotiation() {
            let f = fixture();
            let err = f
                .engine
                .update_negotiation_status(StatusUpdate {
                    negotiation_id: NegotiationId::new_v4(),
                    actor: UserId::new("farmer"),
                    status: NegotiationStatus::Accepted,
                })
                .await
                .unwrap_err();
            assert_eq!(err.code(), "negotiation_not_found");
        }

        #[tokio::test]
        async fn failed_commit_leaves_both_untouched() {
            let f = fixture();
            let (order, n) = opened(&f).await;
            f.db.fail_next_commit();

            let err = f
                .engine
                .update_negotiation_status(status(&n, "farmer", NegotiationStatus::Accepted))
                .await
                .unwrap_err();
            assert!(err.is_infrastructure());

            let stored_order = f.db.orders().get(&order.id()).await.unwrap().unwrap();
            let stored_neg = f.engine.get_negotiation(&n.id()).await.unwrap();
            assert!(stored_order.is_open());
            assert!(stored_order.final_price().is_none());
            assert!(stored_neg.is_open());
            assert!(stored_neg.final_price().is_none());
        }

        #[tokio::test]
        async fn accept_on_already_matched_order_fails() {
            let f = fixture();
            let order = place(&f.db, "farmer", OrderType::Sell).await;
            let first = f
                .engine
                .create_or_update_negotiation(offer(&order, "factory-1", 18))
                .await
                .unwrap();
            let second = f
                .engine
                .create_or_update_negotiation(offer(&order, "factory-2", 19))
                .await
                .unwrap();
            f.engine
                .update_negotiation_status(status(&first, "farmer", NegotiationStatus::Accepted))
                .await
                .unwrap();

            let err = f
                .engine
                .update_negotiation_status(status(&second, "farmer", NegotiationStatus::Accepted))
                .await
                .unwrap_err();
            assert_eq!(err.code(), "order_not_open");
            assert!(f.engine.get_negotiation(&second.id()).await.unwrap().is_open());
            let stored = f.db.orders().get(&order.id()).await.unwrap().unwrap();
            assert_eq!(stored.final_price(), Some(Price::new(18.0).unwrap()));
        }
    }

    mod listing {
        use super::*;

        #[tokio::test]
        async fn lists_by_order_and_party() {
            let f = fixture();
            let order = place(&f.db, "farmer", OrderType::Sell).await;
            f.engine
                .create_or_update_negotiation(offer(&order, "factory-1", 18))
                .await
                .unwrap();
            let latest = f
                .engine
                .create_or_update_negotiation(offer(&order, "factory-2", 19))
                .await
                .unwrap();

            let by_order = f
                .engine
                .list_negotiations_by_order(&order.id(), None)
                .await
                .unwrap();
            assert_eq!(by_order.len(), 2);
            assert_eq!(by_order[0].id(), latest.id());

            let by_farmer = f
                .engine
                .list_negotiations_by_farmer(&UserId::new("farmer"), None)
                .await
                .unwrap();
            assert_eq!(by_farmer.len(), 2);

            let by_factory = f
                .engine
                .list_negotiations_by_factory(
                    &UserId::new("factory-1"),
                    Some(Pagination::new(1, 1).unwrap()),
                )
                .await
                .unwrap();
            assert_eq!(by_factory.len(), 1);
        }
    }
}
