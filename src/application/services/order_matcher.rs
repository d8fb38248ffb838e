//! # Order Matching
//!
//! Suggests counter-orders for a source order using a location-tiered
//! priority policy.
//!
//! # Tiers
//!
//! ```text
//! 1. same_amphoe    same province and district, newest first
//! 2. same_province  same province, other district, newest first
//! ```
//!
//! Candidates always have the opposite order type, the same grade and
//! status `open`. Tier 2 is queried only if tier 1 leaves room. This is a
//! bounded greedy lookup, not an order book: prices are not compared.

use crate::application::dto::MatchCandidate;
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::entities::order::Order;
use crate::domain::value_objects::{MatchPriority, OrderId};
use crate::infrastructure::persistence::{CounterOrderQuery, OrderRepository};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Default number of candidates returned when the caller gives no limit.
pub const DEFAULT_MATCH_LIMIT: usize = 10;

/// Largest limit a caller may request.
pub const MAX_MATCH_LIMIT: usize = 50;

/// Limits applied by the [`OrderMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherConfig {
    default_limit: usize,
    max_limit: usize,
}

impl MatcherConfig {
    /// Creates a configuration.
    ///
    /// Returns `None` unless `1 <= default_limit <= max_limit`.
    #[must_use]
    pub fn new(default_limit: usize, max_limit: usize) -> Option<Self> {
        if default_limit == 0 || default_limit > max_limit {
            return None;
        }
        Some(Self {
            default_limit,
            max_limit,
        })
    }

    /// Returns the limit used when the caller gives none.
    #[must_use]
    pub const fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Returns the largest accepted limit.
    #[must_use]
    pub const fn max_limit(&self) -> usize {
        self.max_limit
    }

    /// Resolves a requested limit into the accepted range.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Validation` if the limit is outside `1..=max_limit`.
    pub fn resolve_limit(&self, requested: Option<usize>) -> ApplicationResult<usize> {
        match requested {
            None => Ok(self.default_limit),
            Some(limit) if (1..=self.max_limit).contains(&limit) => Ok(limit),
            Some(limit) => Err(ApplicationError::validation(format!(
                "limit must be between 1 and {}, got {limit}",
                self.max_limit
            ))),
        }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_MATCH_LIMIT,
            max_limit: MAX_MATCH_LIMIT,
        }
    }
}

/// Merges the two tier query results into the final candidate list.
///
/// Drops the source order from both tiers, drops tier-2 rows already in
/// tier 1 or located in the source district, and truncates to `limit`.
#[must_use]
pub fn merge_tiers(
    source: &Order,
    same_amphoe: Vec<Order>,
    same_province: Vec<Order>,
    limit: usize,
) -> Vec<MatchCandidate> {
    let mut seen: HashSet<OrderId> = HashSet::new();
    seen.insert(source.id());

    let mut candidates = Vec::with_capacity(limit);
    for order in same_amphoe {
        if candidates.len() >= limit {
            break;
        }
        if seen.insert(order.id()) {
            candidates.push(MatchCandidate {
                order,
                priority: MatchPriority::SameAmphoe,
            });
        }
    }
    for order in same_province {
        if candidates.len() >= limit {
            break;
        }
        if order.district() == source.district() {
            continue;
        }
        if seen.insert(order.id()) {
            candidates.push(MatchCandidate {
                order,
                priority: MatchPriority::SameProvince,
            });
        }
    }
    candidates
}

/// Finds counter-orders for a source order.
#[derive(Debug, Clone)]
pub struct OrderMatcher {
    orders: Arc<dyn OrderRepository>,
    config: MatcherConfig,
}

impl OrderMatcher {
    /// Creates a matcher with default limits.
    #[must_use]
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self::with_config(orders, MatcherConfig::default())
    }

    /// Creates a matcher with custom limits.
    #[must_use]
    pub fn with_config(orders: Arc<dyn OrderRepository>, config: MatcherConfig) -> Self {
        Self { orders, config }
    }

    /// Returns the current configuration.
    #[must_use]
    pub const fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Returns up to `limit` counter-orders, same-district ones first.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::Validation` if `limit` is out of range
    /// - `ApplicationError::OrderNotFound` if the source order does not exist
    /// - `ApplicationError::Repository` if a lookup fails
    pub async fn find_matches_for_order(
        &self,
        order_id: &OrderId,
        limit: Option<usize>,
    ) -> ApplicationResult<Vec<MatchCandidate>> {
        let limit = self.config.resolve_limit(limit)?;
        let source = self
            .orders
            .get(order_id)
            .await?
            .ok_or(ApplicationError::OrderNotFound(*order_id))?;

        let base = CounterOrderQuery::for_source(&source, limit);
        let same_amphoe = self
            .orders
            .find_open_counter_orders(&base.clone().in_district(source.district()))
            .await?;

        let tier1 = same_amphoe
            .iter()
            .filter(|o| o.id() != source.id())
            .count();
        let same_province = if tier1 < limit {
            let wider = CounterOrderQuery {
                limit: limit.saturating_mul(2),
                ..base
            };
            self.orders.find_open_counter_orders(&wider).await?
        } else {
            Vec::new()
        };

        let fetched_province = same_province.len();
        let candidates = merge_tiers(&source, same_amphoe, same_province, limit);
        debug!(
            order_id = %source.id(),
            limit,
            same_amphoe = tier1,
            same_province_fetched = fetched_province,
            returned = candidates.len(),
            "matches found"
        );
        Ok(candidates)
    }
}
