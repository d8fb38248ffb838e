//! # PostgreSQL Negotiation Repository
//!
//! The `negotiations_one_open_per_triple` partial unique index turns a lost
//! race between two first-round inserts into `RepositoryError::Duplicate`.

use crate::domain::entities::negotiation::Negotiation;
use crate::domain::value_objects::{NegotiationId, OrderId, Pagination, UserId};
use crate::infrastructure::persistence::postgres::rows::{
    NEGOTIATION_COLUMNS, NegotiationRow, to_db_rounds, to_db_version,
};
use crate::infrastructure::persistence::postgres::{connection_error, map_sqlx_error};
use crate::infrastructure::persistence::traits::{
    NegotiationRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

pub(crate) async fn fetch(
    conn: &mut PgConnection,
    id: &NegotiationId,
) -> RepositoryResult<Option<Negotiation>> {
    let row: Option<NegotiationRow> = sqlx::query_as(&format!(
        "SELECT {NEGOTIATION_COLUMNS} FROM negotiations WHERE id = $1"
    ))
    .bind(id.as_uuid())
    .fetch_optional(conn)
    .await
    .map_err(|e| map_sqlx_error("Negotiation", id.to_string(), e))?;
    row.map(NegotiationRow::try_into_negotiation).transpose()
}

/// Writes the mutable columns if the stored version still matches.
pub(crate) async fn update_versioned(
    conn: &mut PgConnection,
    negotiation: &Negotiation,
) -> RepositoryResult<()> {
    let id = negotiation.id().to_string();
    let result = sqlx::query(
        r#"
        UPDATE negotiations
        SET amount_kg = $2, offered_price = $3, final_price = $4, ref_avg_price = $5,
            price_status = $6, status = $7, last_side = $8, round_count = $9,
            updated_at = $10, version = version + 1
        WHERE id = $1 AND version = $11
        "#,
    )
    .bind(negotiation.id().as_uuid())
    .bind(negotiation.amount().get())
    .bind(negotiation.offered_price().get())
    .bind(negotiation.final_price().map(|p| p.get()))
    .bind(negotiation.ref_avg_price().map(|p| p.get()))
    .bind(negotiation.price_status().as_str())
    .bind(negotiation.status().as_str())
    .bind(negotiation.last_side().as_str())
    .bind(to_db_rounds(negotiation.round_count())?)
    .bind(negotiation.updated_at().as_datetime())
    .bind(to_db_version(negotiation.version())?)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("Negotiation", id.clone(), e))?;

    if result.rows_affected() == 1 {
        return Ok(());
    }
    match fetch(conn, &negotiation.id()).await? {
        Some(current) => Err(RepositoryError::version_conflict(
            "Negotiation",
            id,
            negotiation.version(),
            current.version(),
        )),
        None => Err(RepositoryError::not_found("Negotiation", id)),
    }
}

/// PostgreSQL implementation of [`NegotiationRepository`].
#[derive(Debug, Clone)]
pub struct PostgresNegotiationRepository {
    pool: PgPool,
}

impl PostgresNegotiationRepository {
    /// Creates a new repository over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_where(
        &self,
        column: &'static str,
        value: &str,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Negotiation>> {
        let rows: Vec<NegotiationRow> = sqlx::query_as(&format!(
            r#"
            SELECT {NEGOTIATION_COLUMNS}
            FROM negotiations
            WHERE {column} = $1
            ORDER BY updated_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(value)
        .bind(i64::from(pagination.page_size()))
        .bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        rows.into_iter()
            .map(NegotiationRow::try_into_negotiation)
            .collect()
    }
}

#[async_trait]
impl NegotiationRepository for PostgresNegotiationRepository {
    async fn get(&self, id: &NegotiationId) -> RepositoryResult<Option<Negotiation>> {
        let mut conn = self.pool.acquire().await.map_err(connection_error)?;
        fetch(&mut conn, id).await
    }

    async fn insert(&self, negotiation: &Negotiation) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO negotiations (
                id, order_id, farmer_id, factory_id, province, district, grade,
                original_price, amount_kg, offered_price, final_price, ref_avg_price,
                price_status, status, last_side, round_count, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, 0)
            "#,
        )
        .bind(negotiation.id().as_uuid())
        .bind(negotiation.order_id().as_uuid())
        .bind(negotiation.farmer_id().as_str())
        .bind(negotiation.factory_id().as_str())
        .bind(negotiation.province())
        .bind(negotiation.district())
        .bind(negotiation.grade().as_str())
        .bind(negotiation.original_price().get())
        .bind(negotiation.amount().get())
        .bind(negotiation.offered_price().get())
        .bind(negotiation.final_price().map(|p| p.get()))
        .bind(negotiation.ref_avg_price().map(|p| p.get()))
        .bind(negotiation.price_status().as_str())
        .bind(negotiation.status().as_str())
        .bind(negotiation.last_side().as_str())
        .bind(to_db_rounds(negotiation.round_count())?)
        .bind(negotiation.created_at().as_datetime())
        .bind(negotiation.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Negotiation", negotiation.id().to_string(), e))?;
        Ok(())
    }

    async fn update(&self, negotiation: &Negotiation) -> RepositoryResult<()> {
        let mut conn = self.pool.acquire().await.map_err(connection_error)?;
        update_versioned(&mut conn, negotiation).await
    }

    async fn find_latest_open(
        &self,
        order_id: &OrderId,
        farmer_id: &UserId,
        factory_id: &UserId,
    ) -> RepositoryResult<Option<Negotiation>> {
        let row: Option<NegotiationRow> = sqlx::query_as(&format!(
            r#"
            SELECT {NEGOTIATION_COLUMNS}
            FROM negotiations
            WHERE order_id = $1 AND farmer_id = $2 AND factory_id = $3 AND status = 'open'
            ORDER BY updated_at DESC
            LIMIT 1
            "#
        ))
        .bind(order_id.as_uuid())
        .bind(farmer_id.as_str())
        .bind(factory_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        row.map(NegotiationRow::try_into_negotiation).transpose()
    }

    async fn list_by_order(
        &self,
        order_id: &OrderId,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Negotiation>> {
        let rows: Vec<NegotiationRow> = sqlx::query_as(&format!(
            r#"
            SELECT {NEGOTIATION_COLUMNS}
            FROM negotiations
            WHERE order_id = $1
            ORDER BY updated_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(order_id.as_uuid())
        .bind(i64::from(pagination.page_size()))
        .bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        rows.into_iter()
            .map(NegotiationRow::try_into_negotiation)
            .collect()
    }

    async fn list_by_farmer(
        &self,
        farmer_id: &UserId,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Negotiation>> {
        self.list_where("farmer_id", farmer_id.as_str(), pagination)
            .await
    }

    async fn list_by_factory(
        &self,
        factory_id: &UserId,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Negotiation>> {
        self.list_where("factory_id", factory_id.as_str(), pagination)
            .await
    }
}
