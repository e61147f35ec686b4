//! HTTP handlers for refund endpoints.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::{
    ExecuteRefundHandler, RequestRefundCommand, RequestRefundHandler, ReviewDecision,
    ReviewRefundCommand, ReviewRefundHandler,
};
use crate::domain::foundation::{DomainError, OrderId, RefundRequestId};
use crate::domain::refund::RefundPolicySet;
use crate::ports::{Catalog, Notifier, OrderRepository, PaymentRepository, RefundRepository};

use super::super::error::ApiError;
use super::super::middleware::AuthenticatedUser;
use super::dto::{
    RefundRequestBody, RefundResponse, ReviewDecisionBody, ReviewRefundBody, ReviewRefundResponse,
};

/// Shared state for refund routes.
#[derive(Clone)]
pub struct RefundAppState {
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub refunds: Arc<dyn RefundRepository>,
    pub catalog: Arc<dyn Catalog>,
    pub notifier: Arc<dyn Notifier>,
    pub policies: RefundPolicySet,
    pub executor: Arc<ExecuteRefundHandler>,
}

impl RefundAppState {
    fn request_refund_handler(&self) -> RequestRefundHandler {
        RequestRefundHandler::new(
            self.orders.clone(),
            self.payments.clone(),
            self.refunds.clone(),
            self.catalog.clone(),
            self.notifier.clone(),
            self.policies.clone(),
            self.executor.clone(),
        )
    }

    fn review_refund_handler(&self) -> ReviewRefundHandler {
        ReviewRefundHandler::new(
            self.refunds.clone(),
            self.notifier.clone(),
            self.executor.clone(),
        )
    }
}

/// POST /api/refunds - request a refund against an order.
pub async fn request_refund(
    State(state): State<RefundAppState>,
    user: AuthenticatedUser,
    Json(request): Json<RefundRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = OrderId::from_str(&request.order_id)
        .map_err(|_| DomainError::validation("order_id", "not a valid order id"))?;

    let handler = state.request_refund_handler();
    let cmd = RequestRefundCommand {
        order_id,
        user_id: user.user_id.to_string(),
        refund_type: request.refund_type,
        lines: request.lines.into_iter().map(Into::into).collect(),
        reason: request.reason,
    };

    let result = handler.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(RefundResponse::from(result))))
}

/// POST /api/refunds/:id/review - approve or reject a pending refund.
pub async fn review_refund(
    State(state): State<RefundAppState>,
    user: AuthenticatedUser,
    Path(refund_id): Path<RefundRequestId>,
    Json(request): Json<ReviewRefundBody>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.review_refund_handler();
    let cmd = ReviewRefundCommand {
        refund_id,
        decision: match request.decision {
            ReviewDecisionBody::Approve => ReviewDecision::Approve,
            ReviewDecisionBody::Reject => ReviewDecision::Reject,
        },
        actor: user.user_id.to_string(),
        reason: request.reason,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(ReviewRefundResponse::from(result)))
}
