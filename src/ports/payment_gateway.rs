//! Payment gateway port.
//!
//! Uniform interface to the external payment provider. The port is
//! policy-free: it initiates sessions, verifies transactions, and
//! executes refunds, and reports outcomes without deciding what they
//! mean for orders.
//!
//! # Outcome semantics
//!
//! Every operation distinguishes a *definitive* rejection from an
//! *unknown* outcome (timeout, 5xx, connection reset). Callers must
//! treat unknown outcomes as "money state unclear" and queue
//! reconciliation; only definitive rejections may fail a payment or a
//! refund.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{Money, OrderId, Timestamp};
use crate::domain::payment::{GatewayMetadata, TransactionId};

/// Port for the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a checkout session for the given order context.
    async fn initiate(&self, request: InitiateRequest) -> Result<GatewaySession, GatewayError>;

    /// Verifies a transaction with the provider.
    ///
    /// `Ok(Verification::Valid(_))` means money was captured;
    /// `Ok(Verification::Invalid { .. })` is a definitive rejection.
    /// Transport-level trouble surfaces as `GatewayError`.
    async fn verify(
        &self,
        transaction_id: &TransactionId,
        provider_payload: &serde_json::Value,
    ) -> Result<Verification, GatewayError>;

    /// Refunds `amount` against a captured provider transaction.
    async fn refund(
        &self,
        provider_txn_id: &str,
        amount: Money,
    ) -> Result<GatewayRefund, GatewayError>;
}

/// Order context sent to the gateway when opening a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateRequest {
    pub order_id: OrderId,
    pub transaction_id: TransactionId,
    pub amount: Money,
    pub currency: String,
    pub customer_email: String,
    /// Where the gateway sends the customer after checkout.
    pub return_url: String,
}

/// Checkout session descriptor returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySession {
    pub session_id: String,
    pub redirect_url: String,
    pub provider_txn_id: String,
    pub expires_at: Timestamp,
}

/// Result of a verification call that reached the provider.
#[derive(Debug, Clone)]
pub enum Verification {
    /// The provider confirms capture; normalized fields attached.
    Valid(GatewayMetadata),
    /// The provider definitively rejects the transaction.
    Invalid { reason: String },
}

/// Executed refund descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRefund {
    pub provider_refund_id: String,
    /// Normalized provider response, persisted with the refund request.
    pub response: serde_json::Value,
}

/// Gateway operation errors.
///
/// `Rejected` is definitive; `OutcomeUnknown` means the request may or
/// may not have taken effect on the provider side and requires
/// reconciliation before any retry that could move money twice.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("gateway rejected the operation: {0}")]
    Rejected(String),

    #[error("gateway outcome unknown: {0}")]
    OutcomeUnknown(String),

    #[error("gateway protocol error: {0}")]
    Protocol(String),
}

impl GatewayError {
    /// True when the operation's effect on the provider is unclear.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, GatewayError::OutcomeUnknown(_))
    }
}
