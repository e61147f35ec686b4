//! PostgreSQL implementations of the refund and cancellation
//! repositories.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{CancellationId, DomainError, ErrorCode, OrderId, RefundRequestId};
use crate::domain::refund::{Cancellation, RefundRequest};
use crate::ports::{CancellationRepository, RefundRepository};

use super::{db_error, from_doc, to_doc};

pub struct PostgresRefundRepository {
    pool: PgPool,
}

impl PostgresRefundRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RefundRow {
    doc: serde_json::Value,
}

impl TryFrom<RefundRow> for RefundRequest {
    type Error = DomainError;

    fn try_from(row: RefundRow) -> Result<Self, Self::Error> {
        from_doc("refund_requests", row.doc)
    }
}

#[async_trait]
impl RefundRepository for PostgresRefundRepository {
    async fn create(&self, request: &RefundRequest) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO refund_requests (id, order_id, status, created_at, updated_at, doc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(request.order_id.as_uuid())
        .bind(request.status.as_str())
        .bind(request.created_at.as_datetime())
        .bind(request.updated_at.as_datetime())
        .bind(to_doc("refund_requests", request)?)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("saving refund request", e))?;

        Ok(())
    }

    async fn update(&self, request: &RefundRequest) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE refund_requests SET status = $2, updated_at = $3, doc = $4
            WHERE id = $1
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(request.status.as_str())
        .bind(request.updated_at.as_datetime())
        .bind(to_doc("refund_requests", request)?)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("updating refund request", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::RefundRequestNotFound,
                format!("Refund request {} not found", request.id),
            ));
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &RefundRequestId,
    ) -> Result<Option<RefundRequest>, DomainError> {
        let row: Option<RefundRow> =
            sqlx::query_as("SELECT doc FROM refund_requests WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("finding refund request", e))?;

        row.map(RefundRequest::try_from).transpose()
    }

    async fn find_by_order(&self, order_id: &OrderId) -> Result<Vec<RefundRequest>, DomainError> {
        let rows: Vec<RefundRow> = sqlx::query_as(
            "SELECT doc FROM refund_requests WHERE order_id = $1 ORDER BY created_at ASC",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("listing refund requests", e))?;

        rows.into_iter().map(RefundRequest::try_from).collect()
    }
}

pub struct PostgresCancellationRepository {
    pool: PgPool,
}

impl PostgresCancellationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CancellationRow {
    doc: serde_json::Value,
}

impl TryFrom<CancellationRow> for Cancellation {
    type Error = DomainError;

    fn try_from(row: CancellationRow) -> Result<Self, Self::Error> {
        from_doc("cancellations", row.doc)
    }
}

#[async_trait]
impl CancellationRepository for PostgresCancellationRepository {
    async fn create(&self, cancellation: &Cancellation) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO cancellations (id, order_id, status, requested_at, doc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(cancellation.id.as_uuid())
        .bind(cancellation.scope.order_id().as_uuid())
        .bind(cancellation.status.as_str())
        .bind(cancellation.requested_at.as_datetime())
        .bind(to_doc("cancellations", cancellation)?)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("saving cancellation", e))?;

        Ok(())
    }

    async fn update(&self, cancellation: &Cancellation) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE cancellations SET status = $2, doc = $3
            WHERE id = $1
            "#,
        )
        .bind(cancellation.id.as_uuid())
        .bind(cancellation.status.as_str())
        .bind(to_doc("cancellations", cancellation)?)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("updating cancellation", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::CancellationNotFound,
                format!("Cancellation {} not found", cancellation.id),
            ));
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &CancellationId,
    ) -> Result<Option<Cancellation>, DomainError> {
        let row: Option<CancellationRow> =
            sqlx::query_as("SELECT doc FROM cancellations WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("finding cancellation", e))?;

        row.map(Cancellation::try_from).transpose()
    }
}
