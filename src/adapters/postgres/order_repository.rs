//! PostgreSQL implementation of OrderRepository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, UserId};
use crate::domain::order::Order;
use crate::ports::OrderRepository;

use super::{db_error, from_doc, to_doc};

pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    doc: serde_json::Value,
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        from_doc("orders", row.doc)
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, created_at, updated_at, doc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_str())
        .bind(order.status.as_str())
        .bind(order.created_at.as_datetime())
        .bind(order.updated_at.as_datetime())
        .bind(to_doc("orders", order)?)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("saving order", e))?;

        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET status = $2, updated_at = $3, doc = $4
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.updated_at.as_datetime())
        .bind(to_doc("orders", order)?)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("updating order", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", order.id),
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> = sqlx::query_as("SELECT doc FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("finding order", e))?;

        row.map(Order::try_from).transpose()
    }

    async fn find_many(&self, ids: &[OrderId]) -> Result<Vec<Order>, DomainError> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<OrderRow> = sqlx::query_as("SELECT doc FROM orders WHERE id = ANY($1)")
            .bind(&uuids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("finding orders", e))?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, DomainError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT doc FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("listing orders", e))?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn update_all(&self, orders: &[Order]) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("starting batch update", e))?;

        for order in orders {
            let result = sqlx::query(
                r#"
                UPDATE orders SET status = $2, updated_at = $3, doc = $4
                WHERE id = $1
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(order.status.as_str())
            .bind(order.updated_at.as_datetime())
            .bind(to_doc("orders", order)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("batch-updating order", e))?;

            // Missing row rolls back the entire batch.
            if result.rows_affected() == 0 {
                return Err(DomainError::new(
                    ErrorCode::OrderNotFound,
                    format!("Order {} not found", order.id),
                ));
            }
        }

        tx.commit()
            .await
            .map_err(|e| db_error("committing batch update", e))?;
        Ok(())
    }
}
