//! Payment repository port.
//!
//! Besides plain persistence this port carries the two conditional
//! transitions the fulfillment engine depends on. Both are compare-and-
//! set operations: implementations must make the status check and the
//! write one atomic step (a conditional `UPDATE ... WHERE status =
//! 'pending'`, or an equivalent under one lock), not a read followed by
//! a write. Duplicate gateway callbacks race on exactly this edge.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Money, OrderId, PaymentId, Timestamp};
use crate::domain::payment::{GatewayMetadata, Payment, TransactionId};

/// Result of a conditional completion attempt.
#[derive(Debug, Clone)]
pub enum CompletionClaim {
    /// This caller won: the payment just moved `pending → completed`.
    Completed(Payment),
    /// Another caller got there first (or an earlier crash left the
    /// payment completed). Carries the stored record.
    AlreadyCompleted(Payment),
}

/// Result of a conditional failure attempt.
#[derive(Debug, Clone)]
pub enum FailureClaim {
    /// The payment just moved `pending → failed`.
    Failed(Payment),
    /// The payment had already left `pending`; nothing was written.
    NotPending(Payment),
}

/// Repository port for Payment aggregate persistence.
///
/// Implementations must enforce:
/// - one payment per order (`DuplicatePayment` on violation)
/// - globally unique transaction ids (`DuplicateTransactionId`)
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persists a new payment.
    ///
    /// # Errors
    ///
    /// - `DuplicatePayment` if the order already has a payment
    /// - `DuplicateTransactionId` if the transaction id is taken
    async fn create(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Updates an existing payment.
    async fn update(&self, payment: &Payment) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError>;

    async fn find_by_order(&self, order_id: &OrderId) -> Result<Option<Payment>, DomainError>;

    async fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Payment>, DomainError>;

    /// Collision check used while generating transaction ids.
    async fn transaction_id_exists(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<bool, DomainError>;

    /// Atomically completes the payment if (and only if) it is still
    /// `pending`, storing the provider metadata in the same step.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` for an unknown transaction id
    /// - `InvalidStateTransition` if the payment is failed or cancelled
    async fn complete_if_pending(
        &self,
        transaction_id: &TransactionId,
        metadata: GatewayMetadata,
        now: Timestamp,
    ) -> Result<CompletionClaim, DomainError>;

    /// Atomically fails the payment if it is still `pending`, storing
    /// the rejection reason.
    async fn fail_if_pending(
        &self,
        transaction_id: &TransactionId,
        reason: &str,
        now: Timestamp,
    ) -> Result<FailureClaim, DomainError>;

    /// Sum of completed refund amounts recorded against an order's
    /// payment. Zero when no payment exists.
    async fn refunded_total_for_order(&self, order_id: &OrderId) -> Result<Money, DomainError>;
}
