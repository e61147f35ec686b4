//! HTTP handlers for cancellation endpoints.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::{
    CancellationDecision, ExecuteRefundHandler, ProcessCancellationCommand,
    ProcessCancellationHandler, RequestCancellationCommand, RequestCancellationHandler,
};
use crate::domain::foundation::CancellationId;
use crate::ports::{
    CancellationRepository, JobQueue, Notifier, OrderRepository, PaymentRepository,
    RefundRepository,
};

use super::super::error::ApiError;
use super::super::middleware::AuthenticatedUser;
use super::dto::{
    CancellationDecisionBody, CancellationRequestBody, CancellationResponse,
    ProcessCancellationBody, ProcessCancellationResponse,
};

/// Shared state for cancellation routes.
#[derive(Clone)]
pub struct CancellationAppState {
    pub cancellations: Arc<dyn CancellationRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub refunds: Arc<dyn RefundRepository>,
    pub jobs: Arc<dyn JobQueue>,
    pub notifier: Arc<dyn Notifier>,
    pub executor: Arc<ExecuteRefundHandler>,
}

impl CancellationAppState {
    fn request_cancellation_handler(&self) -> RequestCancellationHandler {
        RequestCancellationHandler::new(self.cancellations.clone(), self.orders.clone())
    }

    fn process_cancellation_handler(&self) -> ProcessCancellationHandler {
        ProcessCancellationHandler::new(
            self.cancellations.clone(),
            self.orders.clone(),
            self.payments.clone(),
            self.refunds.clone(),
            self.jobs.clone(),
            self.notifier.clone(),
            self.executor.clone(),
        )
    }
}

/// POST /api/cancellations - request a cancellation.
pub async fn request_cancellation(
    State(state): State<CancellationAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CancellationRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.request_cancellation_handler();
    let cmd = RequestCancellationCommand {
        scope: request.scope,
        user_id: user.user_id.to_string(),
        mode: request.mode,
        reason: request.reason,
    };

    let result = handler.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(CancellationResponse::from(result))))
}

/// POST /api/cancellations/:id/process - approve or reject a requested
/// cancellation.
pub async fn process_cancellation(
    State(state): State<CancellationAppState>,
    user: AuthenticatedUser,
    Path(cancellation_id): Path<CancellationId>,
    Json(request): Json<ProcessCancellationBody>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.process_cancellation_handler();
    let cmd = ProcessCancellationCommand {
        cancellation_id,
        decision: match request.decision {
            CancellationDecisionBody::Approve => CancellationDecision::Approve,
            CancellationDecisionBody::Reject => CancellationDecision::Reject,
        },
        actor: user.user_id.to_string(),
        reason: request.reason,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(ProcessCancellationResponse::from(result)))
}
