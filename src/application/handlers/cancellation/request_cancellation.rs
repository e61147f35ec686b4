//! RequestCancellationHandler - Command handler recording a
//! cancellation request for later review.

use std::sync::Arc;

use crate::domain::foundation::{
    CancellationId, DomainError, ErrorCode, StateMachine, Timestamp, UserId,
};
use crate::domain::refund::{Cancellation, CancellationMode, CancellationScope, CancellationStatus};
use crate::ports::{CancellationRepository, OrderRepository};

#[derive(Debug, Clone)]
pub struct RequestCancellationCommand {
    pub scope: CancellationScope,
    pub user_id: String,
    pub mode: CancellationMode,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct RequestCancellationResult {
    pub cancellation_id: CancellationId,
    pub status: CancellationStatus,
}

pub struct RequestCancellationHandler {
    cancellations: Arc<dyn CancellationRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl RequestCancellationHandler {
    pub fn new(
        cancellations: Arc<dyn CancellationRepository>,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            cancellations,
            orders,
        }
    }

    pub async fn handle(
        &self,
        cmd: RequestCancellationCommand,
    ) -> Result<RequestCancellationResult, DomainError> {
        let user_id = UserId::new(cmd.user_id)?;
        let now = Timestamp::now();

        let order = self
            .orders
            .find_by_id(&cmd.scope.order_id())
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::OrderNotFound,
                    format!("Order {} not found", cmd.scope.order_id()),
                )
            })?;
        if order.status.is_terminal() {
            return Err(DomainError::new(
                ErrorCode::AlreadyTerminal,
                format!("Order is already {:?}", order.status),
            ));
        }

        // A subscription-scoped request must name a granted plan.
        if let CancellationScope::Subscription { plan_id, .. } = &cmd.scope {
            if !order.subscriptions.iter().any(|s| &s.plan_id == plan_id) {
                return Err(DomainError::new(
                    ErrorCode::PlanNotFound,
                    format!("Order {} has no subscription for plan {}", order.id, plan_id),
                ));
            }
        }

        if let CancellationMode::Scheduled { end_date } = cmd.mode {
            if !end_date.is_after(&now) {
                return Err(DomainError::validation(
                    "end_date",
                    "Scheduled end date must be in the future",
                ));
            }
        }

        let cancellation = Cancellation::request(
            CancellationId::new(),
            cmd.scope,
            user_id,
            cmd.mode,
            cmd.reason,
            now,
        );
        self.cancellations.create(&cancellation).await?;

        tracing::info!(
            cancellation_id = %cancellation.id,
            order_id = %cancellation.scope.order_id(),
            "cancellation requested"
        );
        Ok(RequestCancellationResult {
            cancellation_id: cancellation.id,
            status: cancellation.status,
        })
    }
}
