//! HTTP payment gateway adapter.
//!
//! Talks to the provider's REST API with `reqwest`. Error mapping is
//! where the money semantics live: a transport failure or a 5xx means
//! the request may have taken effect, so it maps to
//! `GatewayError::OutcomeUnknown` and the caller queues
//! reconciliation. Only an explicit 4xx from the provider maps to the
//! definitive `Rejected`.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::foundation::{Money, Timestamp};
use crate::domain::payment::{GatewayMetadata, TransactionId};
use crate::ports::{
    GatewayError, GatewayRefund, GatewaySession, InitiateRequest, PaymentGateway, Verification,
};

/// Provider API configuration.
#[derive(Clone)]
pub struct HttpGatewayConfig {
    api_key: SecretString,
    base_url: String,
    request_timeout: Duration,
}

impl HttpGatewayConfig {
    pub fn new(api_key: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

pub struct HttpGateway {
    config: HttpGatewayConfig,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(config: HttpGatewayConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Sends a request and applies the outcome classification.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<serde_json::Value, GatewayError> {
        let response = request
            .bearer_auth(self.config.api_key.expose_secret())
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(operation, error = %e, "gateway request did not complete");
                GatewayError::OutcomeUnknown(format!("{}: {}", operation, e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            GatewayError::OutcomeUnknown(format!("{}: reading response: {}", operation, e))
        })?;

        if status.is_server_error() {
            tracing::warn!(operation, status = %status, "gateway 5xx, outcome unknown");
            return Err(GatewayError::OutcomeUnknown(format!(
                "{}: provider returned {}",
                operation, status
            )));
        }
        if status.is_client_error() {
            tracing::info!(operation, status = %status, body = %body, "gateway rejected request");
            return Err(GatewayError::Rejected(rejection_reason(&body, status)));
        }

        serde_json::from_str(&body).map_err(|e| {
            GatewayError::Protocol(format!("{}: invalid response body: {}", operation, e))
        })
    }
}

/// Pulls the provider's human-readable reason out of an error body.
fn rejection_reason(body: &str, status: reqwest::StatusCode) -> String {
    #[derive(Deserialize)]
    struct ProviderErrorBody {
        error: Option<ProviderErrorDetail>,
    }
    #[derive(Deserialize)]
    struct ProviderErrorDetail {
        message: String,
    }

    serde_json::from_str::<ProviderErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .map(|e| e.message)
        .unwrap_or_else(|| format!("provider returned {}", status))
}

#[derive(Deserialize)]
struct SessionResponse {
    session_id: String,
    redirect_url: String,
    provider_txn_id: String,
    expires_at_unix: i64,
}

impl SessionResponse {
    fn into_session(self) -> Result<GatewaySession, GatewayError> {
        let expires_at = Timestamp::from_unix_secs(self.expires_at_unix).ok_or_else(|| {
            GatewayError::Protocol(format!(
                "initiate: session expiry {} out of range",
                self.expires_at_unix
            ))
        })?;

        Ok(GatewaySession {
            session_id: self.session_id,
            redirect_url: self.redirect_url,
            provider_txn_id: self.provider_txn_id,
            expires_at,
        })
    }
}

#[derive(Deserialize)]
struct VerifyResponse {
    status: String,
    reason: Option<String>,
    provider_txn_id: Option<String>,
    method: Option<String>,
    card_brand: Option<String>,
    bank_reference: Option<String>,
}

#[derive(Deserialize)]
struct RefundResponse {
    refund_id: String,
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn initiate(&self, request: InitiateRequest) -> Result<GatewaySession, GatewayError> {
        let body = serde_json::json!({
            "reference": request.transaction_id.as_str(),
            "order_id": request.order_id.to_string(),
            "amount_cents": request.amount.as_cents(),
            "currency": request.currency,
            "customer_email": request.customer_email,
            "return_url": request.return_url,
        });
        let raw = self
            .send(self.client.post(self.url("/v1/sessions")).json(&body), "initiate")
            .await?;
        let session: SessionResponse = serde_json::from_value(raw)
            .map_err(|e| GatewayError::Protocol(format!("initiate: {}", e)))?;

        session.into_session()
    }

    async fn verify(
        &self,
        transaction_id: &TransactionId,
        provider_payload: &serde_json::Value,
    ) -> Result<Verification, GatewayError> {
        let body = serde_json::json!({
            "reference": transaction_id.as_str(),
            "notification": provider_payload,
        });
        let raw = self
            .send(
                self.client.post(self.url("/v1/transactions/verify")).json(&body),
                "verify",
            )
            .await?;
        let verification: VerifyResponse = serde_json::from_value(raw)
            .map_err(|e| GatewayError::Protocol(format!("verify: {}", e)))?;

        match verification.status.as_str() {
            "captured" => Ok(Verification::Valid(GatewayMetadata {
                provider_txn_id: verification.provider_txn_id,
                method: verification.method,
                card_brand: verification.card_brand,
                bank_reference: verification.bank_reference,
                ..GatewayMetadata::default()
            })),
            "rejected" => Ok(Verification::Invalid {
                reason: verification
                    .reason
                    .unwrap_or_else(|| "rejected by provider".to_string()),
            }),
            other => Err(GatewayError::Protocol(format!(
                "verify: unexpected status '{}'",
                other
            ))),
        }
    }

    async fn refund(
        &self,
        provider_txn_id: &str,
        amount: Money,
    ) -> Result<GatewayRefund, GatewayError> {
        let body = serde_json::json!({ "amount_cents": amount.as_cents() });
        let raw = self
            .send(
                self.client
                    .post(self.url(&format!("/v1/transactions/{}/refunds", provider_txn_id)))
                    .json(&body),
                "refund",
            )
            .await?;
        let refund: RefundResponse = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::Protocol(format!("refund: {}", e)))?;

        Ok(GatewayRefund {
            provider_refund_id: refund.refund_id,
            response: raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_response(expires_at_unix: i64) -> SessionResponse {
        SessionResponse {
            session_id: "sess_1".to_string(),
            redirect_url: "https://pay.example.com/s/sess_1".to_string(),
            provider_txn_id: "prov_1".to_string(),
            expires_at_unix,
        }
    }

    #[test]
    fn session_expiry_maps_to_timestamp() {
        let session = session_response(1_700_000_000).into_session().unwrap();
        assert_eq!(
            session.expires_at,
            Timestamp::from_unix_secs(1_700_000_000).unwrap()
        );
    }

    #[test]
    fn out_of_range_session_expiry_is_a_protocol_error() {
        let err = session_response(i64::MAX).into_session().unwrap_err();
        assert!(matches!(err, GatewayError::Protocol(_)));
    }

    #[test]
    fn rejection_reason_prefers_provider_message() {
        let body = r#"{"error": {"message": "card declined"}}"#;
        assert_eq!(
            rejection_reason(body, reqwest::StatusCode::PAYMENT_REQUIRED),
            "card declined"
        );
    }

    #[test]
    fn rejection_reason_falls_back_to_status() {
        assert_eq!(
            rejection_reason("not json", reqwest::StatusCode::BAD_REQUEST),
            "provider returned 400 Bad Request"
        );
    }
}
