//! HTTP DTOs for gateway webhook callbacks.

use serde::{Deserialize, Serialize};

/// Minimal shape of a gateway IPN event; the full body is forwarded to
/// gateway verification untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct IpnEvent {
    pub transaction_id: String,
}

/// Acknowledgement returned to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct IpnAck {
    /// One of `fulfilled`, `already_processed`, `payment_failed`,
    /// `queued_for_reconciliation`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl IpnAck {
    pub fn new(status: &'static str) -> Self {
        Self {
            status,
            order_id: None,
        }
    }

    pub fn with_order(status: &'static str, order_id: String) -> Self {
        Self {
            status,
            order_id: Some(order_id),
        }
    }
}
