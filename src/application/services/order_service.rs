//! # Order Service
//!
//! Places orders and serves order lookups.
//!
//! Every new order is evaluated against the latest reference price before
//! it is stored, so the order carries the snapshot it was placed with.

use crate::application::dto::{CreatedOrder, MatchCandidate, NewOrder};
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::order_matcher::OrderMatcher;
use crate::application::services::price_evaluator::PriceEvaluator;
use crate::domain::entities::order::Order;
use crate::domain::value_objects::pagination::DEFAULT_PAGE_SIZE;
use crate::domain::value_objects::{OrderId, Pagination, UserId};
use crate::infrastructure::persistence::OrderRepository;
use std::sync::Arc;
use tracing::{debug, info};

/// Order placement and lookup.
#[derive(Debug, Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    evaluator: PriceEvaluator,
    matcher: OrderMatcher,
    page_size: u32,
}

impl OrderService {
    /// Creates a new order service.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        evaluator: PriceEvaluator,
        matcher: OrderMatcher,
    ) -> Self {
        Self {
            orders,
            evaluator,
            matcher,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the page size used when a listing gives no pagination.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Validates, evaluates and stores a new open order.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::Domain` for a blank location or a non-positive
    ///   quantity or price
    /// - `ApplicationError::Repository` if the reference lookup or insert fails
    pub async fn create_order(&self, request: NewOrder) -> ApplicationResult<CreatedOrder> {
        let params = request.into_params()?;
        let evaluation = self
            .evaluator
            .evaluate_price(params.location.province(), params.grade, params.requested_price)
            .await?;

        let order = Order::new(params, &evaluation);
        self.orders.insert(&order).await?;

        info!(
            order_id = %order.id(),
            owner = %order.owner(),
            order_type = %order.order_type(),
            location = %order.location(),
            grade = %order.grade(),
            requested_price = %order.requested_price(),
            price_status = %evaluation.status(),
            "order created"
        );
        Ok(CreatedOrder { order, evaluation })
    }

    /// Returns an order by ID.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::OrderNotFound` if it does not exist
    /// - `ApplicationError::Repository` if the lookup fails
    pub async fn get_order(&self, order_id: &OrderId) -> ApplicationResult<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(ApplicationError::OrderNotFound(*order_id))
    }

    /// Lists an account's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Repository` if the lookup fails.
    pub async fn list_orders_by_owner(
        &self,
        owner: &UserId,
        pagination: Option<Pagination>,
    ) -> ApplicationResult<Vec<Order>> {
        let page = match pagination {
            Some(page) => page,
            None => Pagination::new(1, self.page_size)?,
        };
        debug!(%owner, page = page.page(), "listing orders by owner");
        Ok(self.orders.list_by_owner(owner, page).await?)
    }

    /// Suggests counter-orders for `order_id`.
    ///
    /// # Errors
    ///
    /// See [`OrderMatcher::find_matches_for_order`].
    pub async fn find_matches_for_order(
        &self,
        order_id: &OrderId,
        limit: Option<usize>,
    ) -> ApplicationResult<Vec<MatchCandidate>> {
        self.matcher.find_matches_for_order(order_id, limit).await
    }
}
