//! # Marketplace
//!
//! Wires the application services over one set of repositories.
//!
//! # Examples
//!
//! ```
//! use produce_market::config::AppConfig;
//! use produce_market::infrastructure::persistence::in_memory::InMemoryDatabase;
//! use produce_market::market::Marketplace;
//!
//! let db = InMemoryDatabase::new();
//! let market = Marketplace::in_memory(&AppConfig::default(), &db).unwrap();
//! assert_eq!(market.prices.config().threshold_percent().to_string(), "20");
//! ```

use crate::application::services::{
    NegotiationEngine, OrderMatcher, OrderService, PriceEvaluator,
};
use crate::config::{AppConfig, ConfigError};
use crate::infrastructure::persistence::in_memory::InMemoryDatabase;
use crate::infrastructure::persistence::postgres::PostgresDatabase;
use crate::infrastructure::persistence::{
    NegotiationRepository, OrderRepository, ReferencePriceRepository, UnitOfWork,
};
use std::sync::Arc;

/// The application services sharing one store.
#[derive(Debug, Clone)]
pub struct Marketplace {
    /// Order placement, lookup and matching.
    pub orders: OrderService,
    /// Reference price evaluation.
    pub prices: PriceEvaluator,
    /// Negotiation lifecycle.
    pub negotiations: NegotiationEngine,
}

impl Marketplace {
    /// Builds the services over arbitrary repositories.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the configuration is inconsistent.
    pub fn build(
        config: &AppConfig,
        orders: Arc<dyn OrderRepository>,
        negotiations: Arc<dyn NegotiationRepository>,
        references: Arc<dyn ReferencePriceRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let prices = PriceEvaluator::with_config(references, config.pricing.threshold()?);
        let matcher = OrderMatcher::with_config(Arc::clone(&orders), config.matching.matcher()?);
        let order_service = OrderService::new(Arc::clone(&orders), prices.clone(), matcher)
            .with_page_size(config.negotiation.page_size);
        let engine = NegotiationEngine::new(orders, negotiations, unit_of_work)
            .with_page_size(config.negotiation.page_size);

        Ok(Self {
            orders: order_service,
            prices,
            negotiations: engine,
        })
    }

    /// Builds the services over an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the configuration is inconsistent.
    pub fn in_memory(config: &AppConfig, db: &InMemoryDatabase) -> Result<Self, ConfigError> {
        Self::build(
            config,
            Arc::new(db.orders()),
            Arc::new(db.negotiations()),
            Arc::new(db.reference_prices()),
            Arc::new(db.clone()),
        )
    }

    /// Builds the services over a PostgreSQL pool.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the configuration is inconsistent.
    pub fn postgres(config: &AppConfig, db: &PostgresDatabase) -> Result<Self, ConfigError> {
        Self::build(
            config,
            Arc::new(db.orders()),
            Arc::new(db.negotiations()),
            Arc::new(db.reference_prices()),
            Arc::new(db.clone()),
        )
    }
}
