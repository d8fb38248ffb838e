//! # Persistence Layer
//!
//! Repository ports and their implementations.
//!
//! ## Repository Traits (Ports)
//!
//! - [`OrderRepository`]: Persistence for orders
//! - [`NegotiationRepository`]: Persistence for negotiations
//! - [`ReferencePriceRepository`]: Reference price lookup
//! - [`UnitOfWork`]: Atomic multi-entity commits
//!
//! ## Implementations
//!
//! - `in_memory`: In-memory implementations for testing
//! - `postgres`: PostgreSQL implementations using sqlx

pub mod in_memory;
pub mod postgres;
pub mod traits;

pub use traits::{
    CounterOrderQuery, NegotiationRepository, OrderRepository, ReferencePriceRepository,
    RepositoryError, RepositoryResult, UnitOfWork, Write, WriteBatch,
};
