//! In-memory payment repository.
//!
//! The compare-and-set transitions hold one lock across the status
//! check and the write, matching the conditional-UPDATE semantics of
//! the Postgres adapter. Concurrent duplicate callbacks racing on
//! `complete_if_pending` therefore serialize here exactly as they do
//! in production.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode, Money, OrderId, PaymentId, Timestamp};
use crate::domain::payment::{GatewayMetadata, Payment, PaymentStatus, TransactionId};
use crate::ports::{CompletionClaim, FailureClaim, PaymentRepository};

pub struct InMemoryPaymentRepository {
    payments: Mutex<HashMap<PaymentId, Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self {
            payments: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPaymentRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(transaction_id: &TransactionId) -> DomainError {
    DomainError::new(
        ErrorCode::PaymentNotFound,
        format!("No payment for transaction {}", transaction_id.as_str()),
    )
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.lock().expect("payments lock poisoned");
        if payments.values().any(|p| p.order_id == payment.order_id) {
            return Err(DomainError::new(
                ErrorCode::DuplicatePayment,
                format!("Order {} already has a payment", payment.order_id),
            ));
        }
        if payments
            .values()
            .any(|p| p.transaction_id == payment.transaction_id)
        {
            return Err(DomainError::new(
                ErrorCode::DuplicateTransactionId,
                format!("Transaction id {} already exists", payment.transaction_id.as_str()),
            ));
        }
        payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.lock().expect("payments lock poisoned");
        match payments.get_mut(&payment.id) {
            Some(existing) => {
                *existing = payment.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("Payment {} not found", payment.id),
            )),
        }
    }

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .payments
            .lock()
            .expect("payments lock poisoned")
            .get(id)
            .cloned())
    }

    async fn find_by_order(&self, order_id: &OrderId) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .payments
            .lock()
            .expect("payments lock poisoned")
            .values()
            .find(|p| &p.order_id == order_id)
            .cloned())
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .payments
            .lock()
            .expect("payments lock poisoned")
            .values()
            .find(|p| &p.transaction_id == transaction_id)
            .cloned())
    }

    async fn transaction_id_exists(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<bool, DomainError> {
        Ok(self
            .payments
            .lock()
            .expect("payments lock poisoned")
            .values()
            .any(|p| &p.transaction_id == transaction_id))
    }

    async fn complete_if_pending(
        &self,
        transaction_id: &TransactionId,
        metadata: GatewayMetadata,
        now: Timestamp,
    ) -> Result<CompletionClaim, DomainError> {
        let mut payments = self.payments.lock().expect("payments lock poisoned");
        let payment = payments
            .values_mut()
            .find(|p| &p.transaction_id == transaction_id)
            .ok_or_else(|| not_found(transaction_id))?;

        match payment.status {
            PaymentStatus::Pending => {
                payment.complete(metadata, now)?;
                Ok(CompletionClaim::Completed(payment.clone()))
            }
            status if status.is_paid() => Ok(CompletionClaim::AlreadyCompleted(payment.clone())),
            status => Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot complete a payment in {:?} state", status),
            )),
        }
    }

    async fn fail_if_pending(
        &self,
        transaction_id: &TransactionId,
        reason: &str,
        now: Timestamp,
    ) -> Result<FailureClaim, DomainError> {
        let mut payments = self.payments.lock().expect("payments lock poisoned");
        let payment = payments
            .values_mut()
            .find(|p| &p.transaction_id == transaction_id)
            .ok_or_else(|| not_found(transaction_id))?;

        if payment.status == PaymentStatus::Pending {
            payment.fail(reason, now)?;
            Ok(FailureClaim::Failed(payment.clone()))
        } else {
            Ok(FailureClaim::NotPending(payment.clone()))
        }
    }

    async fn refunded_total_for_order(&self, order_id: &OrderId) -> Result<Money, DomainError> {
        Ok(self
            .payments
            .lock()
            .expect("payments lock poisoned")
            .values()
            .find(|p| &p.order_id == order_id)
            .map(|p| p.refund_amount)
            .unwrap_or(Money::ZERO))
    }
}
