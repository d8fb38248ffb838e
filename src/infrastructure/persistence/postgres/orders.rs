//! # PostgreSQL Order Repository
//!
//! Order queries over a single connection, shared by the pooled
//! [`PostgresOrderRepository`] and the batch commit transaction.

use crate::domain::entities::order::Order;
use crate::domain::value_objects::{OrderId, Pagination, UserId};
use crate::infrastructure::persistence::postgres::rows::{ORDER_COLUMNS, OrderRow, to_db_version};
use crate::infrastructure::persistence::postgres::{connection_error, map_sqlx_error};
use crate::infrastructure::persistence::traits::{
    CounterOrderQuery, OrderRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

pub(crate) async fn fetch(conn: &mut PgConnection, id: &OrderId) -> RepositoryResult<Option<Order>> {
    let row: Option<OrderRow> =
        sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(conn)
            .await
            .map_err(|e| map_sqlx_error("Order", id.to_string(), e))?;
    row.map(OrderRow::try_into_order).transpose()
}

pub(crate) async fn insert(conn: &mut PgConnection, order: &Order) -> RepositoryResult<()> {
    let snapshot = order.snapshot();
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, owner_id, order_type, province, district, grade,
            quantity_kg, requested_price, status, ref_avg_price, price_status,
            diff_percent, created_at, matched_at, final_price, version
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, 0)
        "#,
    )
    .bind(order.id().as_uuid())
    .bind(order.owner().as_str())
    .bind(order.order_type().as_str())
    .bind(order.province())
    .bind(order.district())
    .bind(order.grade().as_str())
    .bind(order.quantity().get())
    .bind(order.requested_price().get())
    .bind(order.status().as_str())
    .bind(snapshot.ref_avg_price.map(|p| p.get()))
    .bind(snapshot.price_status.as_str())
    .bind(snapshot.diff_percent)
    .bind(order.created_at().as_datetime())
    .bind(order.matched_at().map(|t| *t.as_datetime()))
    .bind(order.final_price().map(|p| p.get()))
    .execute(conn)
    .await
    .map_err(|e| map_sqlx_error("Order", order.id().to_string(), e))?;
    Ok(())
}

/// Writes the mutable lifecycle columns if the stored version still matches.
pub(crate) async fn update_versioned(conn: &mut PgConnection, order: &Order) -> RepositoryResult<()> {
    let id = order.id().to_string();
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = $2, matched_at = $3, final_price = $4, version = version + 1
        WHERE id = $1 AND version = $5
        "#,
    )
    .bind(order.id().as_uuid())
    .bind(order.status().as_str())
    .bind(order.matched_at().map(|t| *t.as_datetime()))
    .bind(order.final_price().map(|p| p.get()))
    .bind(to_db_version(order.version())?)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("Order", id.clone(), e))?;

    if result.rows_affected() == 1 {
        return Ok(());
    }
    match fetch(conn, &order.id()).await? {
        Some(current) => Err(RepositoryError::version_conflict(
            "Order",
            id,
            order.version(),
            current.version(),
        )),
        None => Err(RepositoryError::not_found("Order", id)),
    }
}

/// PostgreSQL implementation of [`OrderRepository`].
#[derive(Debug, Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a new repository over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn get(&self, id: &OrderId) -> RepositoryResult<Option<Order>> {
        let mut conn = self.pool.acquire().await.map_err(connection_error)?;
        fetch(&mut conn, id).await
    }

    async fn exists(&self, id: &OrderId) -> RepositoryResult<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("Order", id.to_string(), e))?;
        Ok(exists)
    }

    async fn insert(&self, order: &Order) -> RepositoryResult<()> {
        let mut conn = self.pool.acquire().await.map_err(connection_error)?;
        insert(&mut conn, order).await
    }

    async fn find_open_counter_orders(
        &self,
        query: &CounterOrderQuery,
    ) -> RepositoryResult<Vec<Order>> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE status = 'open'
              AND order_type = $1
              AND grade = $2
              AND province = $3
              AND ($4::TEXT IS NULL OR district = $4)
            ORDER BY created_at DESC, id
            LIMIT $5
            "#
        ))
        .bind(query.order_type.as_str())
        .bind(query.grade.as_str())
        .bind(&query.province)
        .bind(query.district.as_deref())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        rows.into_iter().map(OrderRow::try_into_order).collect()
    }

    async fn list_by_owner(
        &self,
        owner: &UserId,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE owner_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner.as_str())
        .bind(i64::from(pagination.page_size()))
        .bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        rows.into_iter().map(OrderRow::try_into_order).collect()
    }
}
