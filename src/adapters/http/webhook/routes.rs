//! Route configuration for webhook endpoints.

use axum::routing::post;
use axum::Router;

use super::handlers::{gateway_webhook, WebhookAppState};

/// Creates the webhook router.
///
/// Routes:
/// - `POST /api/webhooks/gateway` - Gateway IPN callback (HMAC verified)
pub fn webhook_router() -> Router<WebhookAppState> {
    Router::new().route("/api/webhooks/gateway", post(gateway_webhook))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use hmac::{Hmac, Mac};
    use secrecy::SecretString;
    use sha2::Sha256;
    use tower::ServiceExt;

    use crate::adapters::gateway::{IpnVerifier, MockGateway};
    use crate::adapters::memory::{
        InMemoryAutomationRepository, InMemoryCartStore, InMemoryCatalog, InMemoryJobQueue,
        InMemoryOrderRepository, InMemoryPaymentRepository,
    };
    use crate::adapters::notifier::LoggingNotifier;
    use crate::application::handlers::AutomationEngine;

    const SECRET: &str = "whsec_test";

    fn state() -> WebhookAppState {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let jobs = Arc::new(InMemoryJobQueue::new());
        let notifier = Arc::new(LoggingNotifier::new());
        let automation = Arc::new(AutomationEngine::new(
            Arc::new(InMemoryAutomationRepository::new()),
            orders.clone(),
            jobs.clone(),
            notifier.clone(),
        ));

        WebhookAppState {
            orders,
            payments: Arc::new(InMemoryPaymentRepository::new()),
            catalog: Arc::new(InMemoryCatalog::new()),
            cart: Arc::new(InMemoryCartStore::new()),
            gateway: Arc::new(MockGateway::succeeding()),
            jobs,
            notifier,
            automation,
            ipn: Arc::new(IpnVerifier::new(SecretString::new(SECRET.to_string()))),
        }
    }

    fn sign(body: &str) -> String {
        let timestamp = chrono::Utc::now().timestamp();
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{}.{}", timestamp, body).as_bytes());
        let digest = mac.finalize().into_bytes();
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        format!("t={},v1={}", timestamp, hex)
    }

    #[tokio::test]
    async fn webhook_rejects_bad_signature() {
        let app = webhook_router().with_state(state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/webhooks/gateway")
                    .header("Gateway-Signature", "t=0,v1=deadbeef")
                    .body(Body::from(r#"{"transaction_id":"TXN-X"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn webhook_rejects_missing_signature() {
        let app = webhook_router().with_state(state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/webhooks/gateway")
                    .body(Body::from(r#"{"transaction_id":"TXN-X"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signed_webhook_for_unknown_payment_is_not_found() {
        let app = webhook_router().with_state(state());
        let body = r#"{"transaction_id":"TXN-20240101-deadbeef"}"#;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/webhooks/gateway")
                    .header("Gateway-Signature", sign(body))
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
