//! HTTP handlers for gateway webhook callbacks.
//!
//! The IPN body is authenticated with an HMAC signature header before
//! anything is parsed. A webhook that fails verification gets a 401 and
//! is otherwise ignored; an unknown gateway outcome gets a 202 so the
//! gateway stops retrying while the reconciliation job re-checks.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};

use crate::adapters::gateway::IpnVerifier;
use crate::application::handlers::{
    AutomationEngine, VerifyPaymentCommand, VerifyPaymentHandler, VerifyPaymentResult,
};
use crate::ports::{
    Catalog, CartStore, JobQueue, Notifier, OrderRepository, PaymentGateway, PaymentRepository,
};

use super::super::error::{ApiError, ErrorResponse};
use super::dto::{IpnAck, IpnEvent};

/// Header carrying the IPN signature, `t=<unix>,v1=<hex>`.
pub const SIGNATURE_HEADER: &str = "Gateway-Signature";

/// Shared state for webhook routes.
#[derive(Clone)]
pub struct WebhookAppState {
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub catalog: Arc<dyn Catalog>,
    pub cart: Arc<dyn CartStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub jobs: Arc<dyn JobQueue>,
    pub notifier: Arc<dyn Notifier>,
    pub automation: Arc<AutomationEngine>,
    pub ipn: Arc<IpnVerifier>,
}

impl WebhookAppState {
    fn verify_payment_handler(&self) -> VerifyPaymentHandler {
        VerifyPaymentHandler::new(
            self.orders.clone(),
            self.payments.clone(),
            self.catalog.clone(),
            self.cart.clone(),
            self.gateway.clone(),
            self.jobs.clone(),
            self.notifier.clone(),
            self.automation.clone(),
        )
    }
}

/// POST /api/webhooks/gateway - verify and process an IPN callback.
pub async fn gateway_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if let Err(err) = state.ipn.verify(body.as_bytes(), signature) {
        tracing::warn!(error = %err, "rejected webhook with bad signature");
        let error = ErrorResponse::new("INVALID_SIGNATURE", err.to_string());
        return Ok((StatusCode::UNAUTHORIZED, Json(error)).into_response());
    }

    let payload: serde_json::Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(err) => {
            let error = ErrorResponse::new("MALFORMED_BODY", err.to_string());
            return Ok((StatusCode::BAD_REQUEST, Json(error)).into_response());
        }
    };
    let event: IpnEvent = match serde_json::from_value(payload.clone()) {
        Ok(event) => event,
        Err(_) => {
            let error = ErrorResponse::new("MALFORMED_BODY", "missing transaction_id");
            return Ok((StatusCode::BAD_REQUEST, Json(error)).into_response());
        }
    };

    let handler = state.verify_payment_handler();
    let cmd = VerifyPaymentCommand {
        transaction_id: event.transaction_id,
        provider_payload: payload,
    };

    let ack = match handler.handle(cmd).await? {
        VerifyPaymentResult::Fulfilled { order_id } => (
            StatusCode::OK,
            Json(IpnAck::with_order("fulfilled", order_id.to_string())),
        ),
        VerifyPaymentResult::AlreadyProcessed { order_id } => (
            StatusCode::OK,
            Json(IpnAck::with_order("already_processed", order_id.to_string())),
        ),
        VerifyPaymentResult::PaymentFailed { .. } => {
            (StatusCode::OK, Json(IpnAck::new("payment_failed")))
        }
        VerifyPaymentResult::QueuedForReconciliation => (
            StatusCode::ACCEPTED,
            Json(IpnAck::new("queued_for_reconciliation")),
        ),
    };

    Ok(ack.into_response())
}
