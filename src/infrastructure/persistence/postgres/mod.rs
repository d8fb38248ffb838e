//! # PostgreSQL Persistence
//!
//! sqlx-backed implementations of the repository traits.
//!
//! Queries are built at runtime (no compile-time checked macros), so the
//! crate builds without a live database. The schema lives in `migrations/`.
//!
//! # Examples
//!
//! ```ignore
//! use produce_market::config::DatabaseConfig;
//! use produce_market::infrastructure::persistence::postgres::PostgresDatabase;
//!
//! let db = PostgresDatabase::connect(&DatabaseConfig::default()).await?;
//! db.migrate().await?;
//! let orders = db.orders();
//! ```

pub mod negotiations;
pub mod orders;
pub mod reference_prices;
mod rows;

pub use negotiations::PostgresNegotiationRepository;
pub use orders::PostgresOrderRepository;
pub use reference_prices::PostgresReferencePriceRepository;

use crate::config::DatabaseConfig;
use crate::infrastructure::persistence::traits::{
    RepositoryError, RepositoryResult, UnitOfWork, Write, WriteBatch,
};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, warn};

/// Maps a sqlx error raised while touching one entity.
pub(crate) fn map_sqlx_error(
    entity_type: &'static str,
    id: impl Into<String>,
    err: sqlx::Error,
) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::duplicate(entity_type, id)
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::connection(err.to_string())
        }
        _ => RepositoryError::query(err.to_string()),
    }
}

pub(crate) fn connection_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::connection(err.to_string())
}

/// Connection pool plus factories for the PostgreSQL repositories.
///
/// Also the [`UnitOfWork`] for this backend: a batch commits inside a
/// single transaction.
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool using the database settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Connection` if the database is unreachable.
    pub async fn connect(config: &DatabaseConfig) -> RepositoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(connection_error)?;
        debug!(max_connections = config.max_connections, "database pool ready");
        Ok(Self { pool })
    }

    /// Applies the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Query` if a migration fails.
    pub async fn migrate(&self) -> RepositoryResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::query(e.to_string()))
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Returns an order repository over this pool.
    #[must_use]
    pub fn orders(&self) -> PostgresOrderRepository {
        PostgresOrderRepository::new(self.pool.clone())
    }

    /// Returns a negotiation repository over this pool.
    #[must_use]
    pub fn negotiations(&self) -> PostgresNegotiationRepository {
        PostgresNegotiationRepository::new(self.pool.clone())
    }

    /// Returns a reference price repository over this pool.
    #[must_use]
    pub fn reference_prices(&self) -> PostgresReferencePriceRepository {
        PostgresReferencePriceRepository::new(self.pool.clone())
    }
}

#[async_trait]
impl UnitOfWork for PostgresDatabase {
    async fn commit(&self, batch: WriteBatch) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await.map_err(connection_error)?;
        for write in batch.writes() {
            let applied = match write {
                Write::Order(order) => orders::update_versioned(&mut tx, order).await,
                Write::Negotiation(negotiation) => {
                    negotiations::update_versioned(&mut tx, negotiation).await
                }
            };
            if let Err(err) = applied {
                warn!(
                    entity = write.entity_type(),
                    id = %write.entity_id(),
                    error = %err,
                    "batch write failed, rolling back"
                );
                // Dropping the transaction rolls it back.
                return Err(err);
            }
        }
        tx.commit().await.map_err(connection_error)?;
        Ok(())
    }
}
