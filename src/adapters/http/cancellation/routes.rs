//! Route configuration for cancellation endpoints.

use axum::middleware::from_fn;
use axum::routing::post;
use axum::Router;

use super::super::middleware::require_admin;
use super::handlers::{process_cancellation, request_cancellation, CancellationAppState};

/// Creates the cancellation router.
///
/// Routes:
/// - `POST /api/cancellations` - Request a cancellation
/// - `POST /api/cancellations/:id/process` - Approve or reject (admin)
pub fn cancellation_router() -> Router<CancellationAppState> {
    Router::new()
        .route(
            "/api/cancellations/:id/process",
            post(process_cancellation).layer(from_fn(require_admin)),
        )
        .route("/api/cancellations", post(request_cancellation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::gateway::MockGateway;
    use crate::adapters::memory::{
        InMemoryCancellationRepository, InMemoryJobQueue, InMemoryOrderRepository,
        InMemoryPaymentRepository, InMemoryRefundRepository,
    };
    use crate::adapters::notifier::LoggingNotifier;
    use crate::application::handlers::ExecuteRefundHandler;
    use crate::domain::foundation::OrderId;

    fn state() -> CancellationAppState {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let payments = Arc::new(InMemoryPaymentRepository::new());
        let refunds = Arc::new(InMemoryRefundRepository::new());
        let jobs = Arc::new(InMemoryJobQueue::new());
        let notifier = Arc::new(LoggingNotifier::new());
        let executor = Arc::new(ExecuteRefundHandler::new(
            refunds.clone(),
            orders.clone(),
            payments.clone(),
            Arc::new(MockGateway::succeeding()),
            jobs.clone(),
            notifier.clone(),
        ));

        CancellationAppState {
            cancellations: Arc::new(InMemoryCancellationRepository::new()),
            orders,
            payments,
            refunds,
            jobs,
            notifier,
            executor,
        }
    }

    #[tokio::test]
    async fn cancellation_for_unknown_order_is_not_found() {
        let app = cancellation_router().with_state(state());
        let body = serde_json::json!({
            "scope": { "target": "order", "order_id": OrderId::new().to_string() },
            "mode": { "mode": "immediate" },
            "reason": "no longer needed",
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/cancellations")
                    .header("X-User-Id", "user-1")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn process_requires_admin_header() {
        let app = cancellation_router().with_state(state());
        let body = serde_json::json!({
            "decision": "approve",
            "reason": "ok",
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!(
                        "/api/cancellations/{}/process",
                        crate::domain::foundation::CancellationId::new()
                    ))
                    .header("X-User-Id", "admin-1")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
