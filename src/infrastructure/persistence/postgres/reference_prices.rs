//! # PostgreSQL Reference Price Repository

use crate::domain::value_objects::{Grade, ReferencePrice};
use crate::infrastructure::persistence::postgres::map_sqlx_error;
use crate::infrastructure::persistence::postgres::rows::{
    REFERENCE_PRICE_COLUMNS, ReferencePriceRow,
};
use crate::infrastructure::persistence::traits::{
    ReferencePriceRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL implementation of [`ReferencePriceRepository`].
#[derive(Debug, Clone)]
pub struct PostgresReferencePriceRepository {
    pool: PgPool,
}

impl PostgresReferencePriceRepository {
    /// Creates a new repository over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferencePriceRepository for PostgresReferencePriceRepository {
    async fn find_latest(
        &self,
        province: &str,
        grade: Grade,
    ) -> RepositoryResult<Option<ReferencePrice>> {
        let row: Option<ReferencePriceRow> = sqlx::query_as(&format!(
            r#"
            SELECT {REFERENCE_PRICE_COLUMNS}
            FROM reference_prices
            WHERE province = $1 AND grade = $2
            ORDER BY updated_at DESC
            LIMIT 1
            "#
        ))
        .bind(province)
        .bind(grade.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        row.map(ReferencePriceRow::try_into_reference).transpose()
    }

    async fn save(&self, reference: &ReferencePrice) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reference_prices (
                id, province, grade, min_price, avg_price, max_price, source, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                min_price = EXCLUDED.min_price,
                avg_price = EXCLUDED.avg_price,
                max_price = EXCLUDED.max_price,
                source = EXCLUDED.source,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(reference.id().as_uuid())
        .bind(reference.province())
        .bind(reference.grade().as_str())
        .bind(reference.min_price().get())
        .bind(reference.avg_price().get())
        .bind(reference.max_price().get())
        .bind(reference.source())
        .bind(reference.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ReferencePrice", reference.id().to_string(), e))?;
        Ok(())
    }
}
