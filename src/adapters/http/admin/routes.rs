//! Route configuration for admin endpoints.

use axum::middleware::from_fn;
use axum::routing::post;
use axum::Router;

use super::super::middleware::require_admin;
use super::handlers::{execute_bulk, AdminAppState};

/// Creates the admin router. Every route requires the admin header.
///
/// Routes:
/// - `POST /api/admin/bulk` - All-or-nothing bulk order operation
pub fn admin_router() -> Router<AdminAppState> {
    Router::new()
        .route("/api/admin/bulk", post(execute_bulk))
        .layer(from_fn(require_admin))
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
        InMemoryAutomationRepository, InMemoryJobQueue, InMemoryOrderRepository,
        InMemoryPaymentRepository, InMemoryRefundRepository,
    };
    use crate::adapters::notifier::LoggingNotifier;
    use crate::application::handlers::{AutomationEngine, ExecuteRefundHandler};
    use crate::domain::foundation::OrderId;

    fn state() -> AdminAppState {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let payments = Arc::new(InMemoryPaymentRepository::new());
        let refunds = Arc::new(InMemoryRefundRepository::new());
        let jobs = Arc::new(InMemoryJobQueue::new());
        let notifier = Arc::new(LoggingNotifier::new());
        let automation = Arc::new(AutomationEngine::new(
            Arc::new(InMemoryAutomationRepository::new()),
            orders.clone(),
            jobs.clone(),
            notifier.clone(),
        ));
        let executor = Arc::new(ExecuteRefundHandler::new(
            refunds.clone(),
            orders.clone(),
            payments.clone(),
            Arc::new(MockGateway::succeeding()),
            jobs,
            notifier,
        ));

        AdminAppState {
            orders,
            payments,
            refunds,
            automation,
            executor,
        }
    }

    #[tokio::test]
    async fn bulk_requires_admin_header() {
        let app = admin_router().with_state(state());
        let body = serde_json::json!({
            "operation": "cancel",
            "reason": "cleanup",
            "refund": false,
            "order_ids": [OrderId::new().to_string()],
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/admin/bulk")
                    .header("X-User-Id", "admin-1")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn bulk_with_missing_order_is_not_found() {
        let app = admin_router().with_state(state());
        let body = serde_json::json!({
            "operation": "cancel",
            "reason": "cleanup",
            "refund": false,
            "order_ids": [OrderId::new().to_string()],
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/admin/bulk")
                    .header("X-User-Id", "admin-1")
                    .header("X-Admin", "true")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
