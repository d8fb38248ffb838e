//! # In-Memory Repositories
//!
//! In-memory implementations for testing without database dependencies.
//!
//! ## Available Types
//!
//! - [`InMemoryDatabase`]: Shared tables and the atomic [`UnitOfWork`](super::UnitOfWork)
//! - [`InMemoryOrderRepository`]: Order persistence
//! - [`InMemoryNegotiationRepository`]: Negotiation persistence
//! - [`InMemoryReferencePriceRepository`]: Reference price lookup
//!
//! ## Thread Safety
//!
//! All implementations share one `Arc<RwLock<..>>` of tables per database.

pub mod database;
pub mod negotiation_repository;
pub mod order_repository;
pub mod reference_price_repository;

pub use database::InMemoryDatabase;
pub use negotiation_repository::InMemoryNegotiationRepository;
pub use order_repository::InMemoryOrderRepository;
pub use reference_price_repository::InMemoryReferencePriceRepository;
