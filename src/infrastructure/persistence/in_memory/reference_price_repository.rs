//! # In-Memory Reference Price Repository
//!
//! In-memory implementation of [`ReferencePriceRepository`] for testing.

use crate::domain::value_objects::{Grade, ReferencePrice};
use crate::infrastructure::persistence::in_memory::database::{SharedTables, Tables};
use crate::infrastructure::persistence::traits::{ReferencePriceRepository, RepositoryResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`ReferencePriceRepository`].
#[derive(Debug, Clone)]
pub struct InMemoryReferencePriceRepository {
    tables: SharedTables,
}

impl InMemoryReferencePriceRepository {
    /// Creates a new empty in-memory reference price repository.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tables(Arc::new(RwLock::new(Tables::default())))
    }

    pub(crate) fn with_tables(tables: SharedTables) -> Self {
        Self { tables }
    }
}

impl Default for InMemoryReferencePriceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReferencePriceRepository for InMemoryReferencePriceRepository {
    async fn find_latest(
        &self,
        province: &str,
        grade: Grade,
    ) -> RepositoryResult<Option<ReferencePrice>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reference_prices
            .values()
            .filter(|r| r.applies_to(province, grade))
            .max_by_key(|r| r.updated_at())
            .cloned())
    }

    async fn save(&self, reference: &ReferencePrice) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .reference_prices
            .insert(reference.id(), reference.clone());
        Ok(())
    }
}
