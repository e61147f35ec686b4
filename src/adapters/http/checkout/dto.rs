//! HTTP DTOs for checkout endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::InitiatePaymentResult;

/// Request to start a payment session for the caller's cart.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    /// Email the gateway sends the receipt to.
    pub customer_email: String,
    /// ISO 4217 currency code, e.g. "usd".
    pub currency: String,
    /// Where the gateway sends the customer after checkout.
    pub return_url: String,
    /// Tax computed upstream, in cents.
    #[serde(default)]
    pub tax_cents: i64,
    /// Shipping computed upstream, in cents.
    #[serde(default)]
    pub shipping_cents: i64,
}

/// Created payment session.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub order_id: String,
    pub payment_id: String,
    pub transaction_id: String,
    pub session_id: String,
    /// URL the customer is redirected to for payment.
    pub gateway_url: String,
    /// Session expiry (ISO 8601).
    pub expires_at: String,
}

impl From<InitiatePaymentResult> for CheckoutResponse {
    fn from(result: InitiatePaymentResult) -> Self {
        Self {
            order_id: result.order_id.to_string(),
            payment_id: result.payment_id.to_string(),
            transaction_id: result.transaction_id.as_str().to_string(),
            session_id: result.session_id,
            gateway_url: result.gateway_url,
            expires_at: result.expires_at.as_datetime().to_rfc3339(),
        }
    }
}
