//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! - [`PriceEvaluator`]: reference-price comparison
//! - [`OrderMatcher`]: location-tiered counter-order lookup
//! - [`NegotiationEngine`]: two-party negotiation lifecycle
//! - [`OrderService`]: order placement and lookup

pub mod negotiation_engine;
pub mod order_matcher;
pub mod order_service;
pub mod price_evaluator;

pub use negotiation_engine::{ActorRole, NegotiationEngine, ResolvedRoles};
pub use order_matcher::{DEFAULT_MATCH_LIMIT, MAX_MATCH_LIMIT, MatcherConfig, OrderMatcher};
pub use order_service::OrderService;
pub use price_evaluator::PriceEvaluator;
