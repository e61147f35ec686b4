//! Payment aggregate entity.
//!
//! One payment record per order, created at checkout and resolved by
//! the gateway verification callback. Refund accounting lives here:
//! `refundable_amount` is always derived, never stored.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, Money, OrderId, PaymentId, StateMachine, Timestamp, UserId,
};

use super::{PaymentStatus, TransactionId};

/// Provider-side facts captured when a payment completes.
///
/// Persisted verbatim for support and reconciliation; all fields come
/// from the gateway's verification response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayMetadata {
    /// Gateway checkout session id.
    pub session_id: Option<String>,

    /// Customer-facing redirect URL for the session.
    pub session_url: Option<String>,

    /// The gateway's own transaction reference.
    pub provider_txn_id: Option<String>,

    /// Payment method (card, bank transfer, wallet).
    pub method: Option<String>,

    /// Card brand, when paid by card.
    pub card_brand: Option<String>,

    /// Bank reference, when paid by transfer.
    pub bank_reference: Option<String>,
}

/// Payment aggregate.
///
/// # Invariants
///
/// - `order_id` is unique across payments (one payment per order)
/// - `transaction_id` is globally unique
/// - `refund_amount <= amount`, so `refundable_amount() >= 0`
/// - status transitions follow the [`PaymentStatus`] state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub transaction_id: TransactionId,

    /// Amount charged, frozen from the order total.
    pub amount: Money,

    pub status: PaymentStatus,
    pub gateway: GatewayMetadata,

    /// Reason recorded on definitive gateway rejection.
    pub failure_reason: Option<String>,

    /// Sum of completed refunds against this payment.
    pub refund_amount: Money,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl Payment {
    /// Creates a pending payment for an order.
    pub fn create(
        id: PaymentId,
        order_id: OrderId,
        user_id: UserId,
        transaction_id: TransactionId,
        amount: Money,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        if amount.is_negative() {
            return Err(DomainError::validation("amount", "Payment amount cannot be negative"));
        }
        Ok(Self {
            id,
            order_id,
            user_id,
            transaction_id,
            amount,
            status: PaymentStatus::Pending,
            gateway: GatewayMetadata::default(),
            failure_reason: None,
            refund_amount: Money::ZERO,
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    /// Amount still available for refunding.
    pub fn refundable_amount(&self) -> Money {
        self.amount.saturating_sub(self.refund_amount)
    }

    /// Stores the gateway session descriptor obtained at initiation.
    pub fn attach_session(&mut self, session_id: String, session_url: String, now: Timestamp) {
        self.gateway.session_id = Some(session_id);
        self.gateway.session_url = Some(session_url);
        self.updated_at = now;
    }

    /// Completes the payment with provider metadata.
    pub fn complete(&mut self, metadata: GatewayMetadata, now: Timestamp) -> Result<(), DomainError> {
        self.transition(PaymentStatus::Completed)?;
        self.gateway.provider_txn_id = metadata.provider_txn_id.or(self.gateway.provider_txn_id.take());
        self.gateway.method = metadata.method;
        self.gateway.card_brand = metadata.card_brand;
        self.gateway.bank_reference = metadata.bank_reference;
        self.failure_reason = None;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Marks the payment failed with the gateway's rejection reason.
    pub fn fail(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), DomainError> {
        self.transition(PaymentStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        self.updated_at = now;
        Ok(())
    }

    /// Reopens a failed payment for a checkout retry.
    pub fn reopen(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition(PaymentStatus::Pending)?;
        self.failure_reason = None;
        self.updated_at = now;
        Ok(())
    }

    /// Records a completed refund of `amount` against this payment.
    ///
    /// Returns `true` when the payment is now fully refunded. The
    /// caller mirrors the resulting status onto the order.
    pub fn apply_refund(&mut self, amount: Money, now: Timestamp) -> Result<bool, DomainError> {
        if !self.status.is_paid() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot refund a payment in {:?} state", self.status),
            ));
        }
        if amount.is_zero() || amount.is_negative() {
            return Err(DomainError::validation("amount", "Refund amount must be positive"));
        }
        if amount > self.refundable_amount() {
            return Err(DomainError::new(
                ErrorCode::RefundExceedsRefundable,
                format!(
                    "Refund of {} exceeds refundable {}",
                    amount,
                    self.refundable_amount()
                ),
            ));
        }

        self.refund_amount = self.refund_amount + amount;
        let fully_refunded = self.refundable_amount().is_zero();
        let target = if fully_refunded {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartiallyRefunded
        };
        // A second partial refund keeps the status at PartiallyRefunded.
        if self.status != target {
            self.transition(target)?;
        }
        self.updated_at = now;
        Ok(fully_refunded)
    }

    fn transition(&mut self, target: PaymentStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot transition payment from {:?} to {:?}", self.status, target),
            )
        })?;
        Ok(())
    }
}
