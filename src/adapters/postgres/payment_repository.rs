//! PostgreSQL implementation of PaymentRepository.
//!
//! The conditional transitions take a `SELECT ... FOR UPDATE` row lock
//! inside a transaction, so the status check, the domain transition,
//! and the write form one atomic step. Duplicate gateway callbacks
//! racing on `complete_if_pending` serialize on that lock and exactly
//! one caller observes the `pending → completed` edge.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::foundation::{DomainError, ErrorCode, Money, OrderId, PaymentId, Timestamp};
use crate::domain::payment::{GatewayMetadata, Payment, PaymentStatus, TransactionId};
use crate::ports::{CompletionClaim, FailureClaim, PaymentRepository};

use super::{db_error, from_doc, to_doc};

pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Locks the payment row for a transaction id.
    async fn lock_payment(
        tx: &mut Transaction<'_, Postgres>,
        transaction_id: &TransactionId,
    ) -> Result<Payment, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(
            "SELECT doc FROM payments WHERE transaction_id = $1 FOR UPDATE",
        )
        .bind(transaction_id.as_str())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| db_error("locking payment", e))?;

        row.map(Payment::try_from).transpose()?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("No payment for transaction {}", transaction_id.as_str()),
            )
        })
    }

    async fn write_locked(
        tx: &mut Transaction<'_, Postgres>,
        payment: &Payment,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE payments SET status = $2, updated_at = $3, doc = $4
            WHERE id = $1
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.status.as_str())
        .bind(payment.updated_at.as_datetime())
        .bind(to_doc("payments", payment)?)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_error("writing payment", e))?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    doc: serde_json::Value,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        from_doc("payments", row.doc)
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, transaction_id, status, created_at, updated_at, doc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.order_id.as_uuid())
        .bind(payment.transaction_id.as_str())
        .bind(payment.status.as_str())
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .bind(to_doc("payments", payment)?)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                match db_err.constraint() {
                    Some("payments_order_id_key") => {
                        return DomainError::new(
                            ErrorCode::DuplicatePayment,
                            format!("Order {} already has a payment", payment.order_id),
                        );
                    }
                    Some("payments_transaction_id_key") => {
                        return DomainError::new(
                            ErrorCode::DuplicateTransactionId,
                            format!(
                                "Transaction id {} already exists",
                                payment.transaction_id.as_str()
                            ),
                        );
                    }
                    _ => {}
                }
            }
            db_error("saving payment", e)
        })?;

        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET status = $2, updated_at = $3, doc = $4
            WHERE id = $1
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.status.as_str())
        .bind(payment.updated_at.as_datetime())
        .bind(to_doc("payments", payment)?)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("updating payment", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("Payment {} not found", payment.id),
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as("SELECT doc FROM payments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("finding payment", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_order(&self, order_id: &OrderId) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> =
            sqlx::query_as("SELECT doc FROM payments WHERE order_id = $1")
                .bind(order_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("finding payment by order", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> =
            sqlx::query_as("SELECT doc FROM payments WHERE transaction_id = $1")
                .bind(transaction_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("finding payment by transaction", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn transaction_id_exists(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<bool, DomainError> {
        let exists: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM payments WHERE transaction_id = $1")
                .bind(transaction_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("checking transaction id", e))?;

        Ok(exists.is_some())
    }

    async fn complete_if_pending(
        &self,
        transaction_id: &TransactionId,
        metadata: GatewayMetadata,
        now: Timestamp,
    ) -> Result<CompletionClaim, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("starting completion", e))?;

        let mut payment = Self::lock_payment(&mut tx, transaction_id).await?;
        let claim = match payment.status {
            PaymentStatus::Pending => {
                payment.complete(metadata, now)?;
                Self::write_locked(&mut tx, &payment).await?;
                CompletionClaim::Completed(payment)
            }
            status if status.is_paid() => CompletionClaim::AlreadyCompleted(payment),
            status => {
                return Err(DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!("Cannot complete a payment in {:?} state", status),
                ));
            }
        };

        tx.commit()
            .await
            .map_err(|e| db_error("committing completion", e))?;
        Ok(claim)
    }

    async fn fail_if_pending(
        &self,
        transaction_id: &TransactionId,
        reason: &str,
        now: Timestamp,
    ) -> Result<FailureClaim, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("starting failure", e))?;

        let mut payment = Self::lock_payment(&mut tx, transaction_id).await?;
        let claim = if payment.status == PaymentStatus::Pending {
            payment.fail(reason, now)?;
            Self::write_locked(&mut tx, &payment).await?;
            FailureClaim::Failed(payment)
        } else {
            FailureClaim::NotPending(payment)
        };

        tx.commit()
            .await
            .map_err(|e| db_error("committing failure", e))?;
        Ok(claim)
    }

    async fn refunded_total_for_order(&self, order_id: &OrderId) -> Result<Money, DomainError> {
        Ok(self
            .find_by_order(order_id)
            .await?
            .map(|p| p.refund_amount)
            .unwrap_or(Money::ZERO))
    }
}
