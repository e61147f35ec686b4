//! Scripted payment gateway for tests.
//!
//! Each constructor fixes the gateway's behavior for the whole test:
//! succeed, definitively reject, or leave every money operation with
//! an unknown outcome. This is how handler tests drive the three
//! outcome classes without a network.

use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::foundation::{Money, Timestamp};
use crate::domain::payment::{GatewayMetadata, TransactionId};
use crate::ports::{
    GatewayError, GatewayRefund, GatewaySession, InitiateRequest, PaymentGateway, Verification,
};

/// Session lifetime the mock stamps on initiated sessions.
const SESSION_TTL_SECS: i64 = 1_800;

enum Behavior {
    /// Everything succeeds.
    Succeeding,
    /// `verify` returns a definitive rejection with this reason.
    Rejecting(String),
    /// `verify` and `refund` both time out (outcome unknown).
    TimingOut,
    /// `refund` is definitively rejected with this reason.
    RefundRejecting(String),
}

pub struct MockGateway {
    behavior: Behavior,
    refund_calls: Mutex<Vec<(String, Money)>>,
}

impl MockGateway {
    pub fn succeeding() -> Self {
        Self::with_behavior(Behavior::Succeeding)
    }

    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Rejecting(reason.into()))
    }

    pub fn timing_out() -> Self {
        Self::with_behavior(Behavior::TimingOut)
    }

    pub fn refund_rejecting(reason: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::RefundRejecting(reason.into()))
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            refund_calls: Mutex::new(Vec::new()),
        }
    }

    /// Refund calls the gateway received (for test assertions).
    pub fn refund_calls(&self) -> Vec<(String, Money)> {
        self.refund_calls.lock().expect("refund_calls lock poisoned").clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initiate(&self, request: InitiateRequest) -> Result<GatewaySession, GatewayError> {
        if let Behavior::TimingOut = self.behavior {
            return Err(GatewayError::OutcomeUnknown("connect timeout".to_string()));
        }
        let session_id = format!("cs_{}", &Uuid::new_v4().simple().to_string()[..12]);
        Ok(GatewaySession {
            redirect_url: format!("https://pay.example.com/checkout/{}", session_id),
            session_id,
            provider_txn_id: format!("prov_{}", request.transaction_id.as_str()),
            expires_at: Timestamp::now().add_secs(SESSION_TTL_SECS),
        })
    }

    async fn verify(
        &self,
        transaction_id: &TransactionId,
        _provider_payload: &serde_json::Value,
    ) -> Result<Verification, GatewayError> {
        match &self.behavior {
            Behavior::Rejecting(reason) => Ok(Verification::Invalid {
                reason: reason.clone(),
            }),
            Behavior::TimingOut => {
                Err(GatewayError::OutcomeUnknown("read timeout".to_string()))
            }
            _ => Ok(Verification::Valid(GatewayMetadata {
                provider_txn_id: Some(format!("prov_{}", transaction_id.as_str())),
                method: Some("card".to_string()),
                card_brand: Some("visa".to_string()),
                ..GatewayMetadata::default()
            })),
        }
    }

    async fn refund(
        &self,
        provider_txn_id: &str,
        amount: Money,
    ) -> Result<GatewayRefund, GatewayError> {
        self.refund_calls
            .lock()
            .expect("refund_calls lock poisoned")
            .push((provider_txn_id.to_string(), amount));

        match &self.behavior {
            Behavior::RefundRejecting(reason) => Err(GatewayError::Rejected(reason.clone())),
            Behavior::TimingOut => {
                Err(GatewayError::OutcomeUnknown("read timeout".to_string()))
            }
            _ => Ok(GatewayRefund {
                provider_refund_id: format!("re_{}", &Uuid::new_v4().simple().to_string()[..12]),
                response: serde_json::json!({
                    "status": "succeeded",
                    "transaction": provider_txn_id,
                    "amount": amount.as_cents(),
                }),
            }),
        }
    }
}
