//! Route configuration for refund endpoints.

use axum::middleware::from_fn;
use axum::routing::post;
use axum::Router;

use super::super::middleware::require_admin;
use super::handlers::{request_refund, review_refund, RefundAppState};

/// Creates the refund router.
///
/// Routes:
/// - `POST /api/refunds` - Request a refund
/// - `POST /api/refunds/:id/review` - Approve or reject a pending refund (admin)
pub fn refund_router() -> Router<RefundAppState> {
    Router::new()
        .route(
            "/api/refunds/:id/review",
            post(review_refund).layer(from_fn(require_admin)),
        )
        .route("/api/refunds", post(request_refund))
}
