//! HTTP handlers for admin endpoints.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::response::IntoResponse;

use crate::application::handlers::{
    AutomationEngine, ExecuteBulkCommand, ExecuteBulkHandler, ExecuteRefundHandler,
};
use crate::ports::{OrderRepository, PaymentRepository, RefundRepository};

use super::super::error::ApiError;
use super::super::middleware::AuthenticatedUser;
use super::dto::{BulkRequestBody, BulkResponse};

/// Shared state for admin routes.
#[derive(Clone)]
pub struct AdminAppState {
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub refunds: Arc<dyn RefundRepository>,
    pub automation: Arc<AutomationEngine>,
    pub executor: Arc<ExecuteRefundHandler>,
}

impl AdminAppState {
    fn execute_bulk_handler(&self) -> ExecuteBulkHandler {
        ExecuteBulkHandler::new(
            self.orders.clone(),
            self.payments.clone(),
            self.refunds.clone(),
            self.automation.clone(),
            self.executor.clone(),
        )
    }
}

/// POST /api/admin/bulk - apply one operation to many orders,
/// all-or-nothing.
pub async fn execute_bulk(
    State(state): State<AdminAppState>,
    user: AuthenticatedUser,
    Json(request): Json<BulkRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.execute_bulk_handler();
    let cmd = ExecuteBulkCommand {
        operation: request.operation,
        order_ids: request.order_ids,
        actor: user.user_id.to_string(),
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(BulkResponse::from(result)))
}
