//! ProcessCancellationHandler - Command handler deciding and executing
//! cancellation requests.
//!
//! Approval applies the cancellation's effects in the same handling:
//! an order-scoped cancellation moves the order to `cancelled` and,
//! when the payment still has refundable money on it, spawns a
//! pre-approved refund request and executes it; a subscription-scoped
//! one adjusts the access window per the requested mode. Scheduled
//! endings go through the durable job queue.

use std::sync::Arc;

use crate::domain::foundation::{
    CancellationId, DomainError, ErrorCode, RefundRequestId, Timestamp,
};
use crate::domain::refund::{
    Cancellation, CancellationMode, CancellationScope, CancellationStatus, RefundRequest,
    RefundType,
};
use crate::ports::{
    CancellationRepository, Job, JobPayload, JobQueue, NotificationKind, Notifier,
    OrderRepository, PaymentRepository, RefundRepository,
};

use super::super::refund::{ExecuteRefundCommand, ExecuteRefundHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone)]
pub struct ProcessCancellationCommand {
    pub cancellation_id: CancellationId,
    pub decision: CancellationDecision,
    pub actor: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ProcessCancellationResult {
    pub cancellation_id: CancellationId,
    pub status: CancellationStatus,
    /// Refund request spawned by an approved, refund-eligible
    /// cancellation.
    pub spawned_refund: Option<RefundRequestId>,
}

pub struct ProcessCancellationHandler {
    cancellations: Arc<dyn CancellationRepository>,
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    refunds: Arc<dyn RefundRepository>,
    jobs: Arc<dyn JobQueue>,
    notifier: Arc<dyn Notifier>,
    executor: Arc<ExecuteRefundHandler>,
}

impl ProcessCancellationHandler {
    pub fn new(
        cancellations: Arc<dyn CancellationRepository>,
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        refunds: Arc<dyn RefundRepository>,
        jobs: Arc<dyn JobQueue>,
        notifier: Arc<dyn Notifier>,
        executor: Arc<ExecuteRefundHandler>,
    ) -> Self {
        Self {
            cancellations,
            orders,
            payments,
            refunds,
            jobs,
            notifier,
            executor,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessCancellationCommand,
    ) -> Result<ProcessCancellationResult, DomainError> {
        let mut cancellation = self
            .cancellations
            .find_by_id(&cmd.cancellation_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::CancellationNotFound,
                    format!("Cancellation {} not found", cmd.cancellation_id),
                )
            })?;
        let now = Timestamp::now();

        if cmd.decision == CancellationDecision::Reject {
            cancellation.reject(cmd.actor.clone(), cmd.reason.clone(), now)?;
            self.cancellations.update(&cancellation).await?;
            tracing::info!(
                cancellation_id = %cancellation.id,
                actor = %cmd.actor,
                "cancellation rejected"
            );
            self.notify(&cancellation, NotificationKind::CancellationRejected)
                .await;
            return Ok(ProcessCancellationResult {
                cancellation_id: cancellation.id,
                status: cancellation.status,
                spawned_refund: None,
            });
        }

        let spawned = match cancellation.scope {
            CancellationScope::Order { order_id } => {
                self.cancel_order(&cancellation, order_id, &cmd, now).await?
            }
            CancellationScope::Subscription { order_id, plan_id } => {
                self.cancel_subscription(&cancellation, order_id, plan_id, now)
                    .await?
            }
        };

        cancellation.approve(cmd.actor.clone(), cmd.reason.clone(), spawned, now)?;
        cancellation.mark_processed(now)?;
        self.cancellations.update(&cancellation).await?;

        tracing::info!(
            cancellation_id = %cancellation.id,
            actor = %cmd.actor,
            spawned_refund = ?spawned,
            "cancellation approved and processed"
        );
        self.notify(&cancellation, NotificationKind::CancellationApproved)
            .await;

        // Spawned refunds execute after the cancellation state is
        // durable; a gateway hiccup leaves them to reconciliation.
        if let Some(refund_id) = spawned {
            if let Err(err) = self
                .executor
                .handle(ExecuteRefundCommand { refund_id })
                .await
            {
                tracing::warn!(
                    cancellation_id = %cancellation.id,
                    refund_id = %refund_id,
                    error = %err,
                    "spawned refund execution failed"
                );
            }
        }

        Ok(ProcessCancellationResult {
            cancellation_id: cancellation.id,
            status: cancellation.status,
            spawned_refund: spawned,
        })
    }

    async fn cancel_order(
        &self,
        cancellation: &Cancellation,
        order_id: crate::domain::foundation::OrderId,
        cmd: &ProcessCancellationCommand,
        now: Timestamp,
    ) -> Result<Option<RefundRequestId>, DomainError> {
        let mut order = self.orders.find_by_id(&order_id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", order_id),
            )
        })?;
        order.cancel(
            Some(cancellation.request_reason.clone()),
            &cmd.actor,
            now,
        )?;
        self.orders.update(&order).await?;

        // Refund-eligible: the payment still has refundable money.
        let payment = self.payments.find_by_order(&order_id).await?;
        let spawned = match payment {
            Some(payment)
                if payment.status.is_paid() && !payment.refundable_amount().is_zero() =>
            {
                let request = RefundRequest::create(
                    RefundRequestId::new(),
                    order_id,
                    cancellation.user_id.clone(),
                    RefundType::Full,
                    payment.refundable_amount(),
                    vec![],
                    format!("cancellation: {}", cancellation.request_reason),
                    true, // pre-approved, no second review
                    now,
                );
                self.refunds.create(&request).await?;
                Some(request.id)
            }
            _ => None,
        };
        Ok(spawned)
    }

    async fn cancel_subscription(
        &self,
        cancellation: &Cancellation,
        order_id: crate::domain::foundation::OrderId,
        plan_id: crate::domain::foundation::PlanId,
        now: Timestamp,
    ) -> Result<Option<RefundRequestId>, DomainError> {
        let mut order = self.orders.find_by_id(&order_id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", order_id),
            )
        })?;
        let grant = order.subscription_mut(plan_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::PlanNotFound,
                format!("Order {} has no subscription for plan {}", order_id, plan_id),
            )
        })?;

        match cancellation.mode {
            CancellationMode::Immediate => grant.end_now(now),
            CancellationMode::EndOfPeriod => grant.disable_auto_renew(),
            CancellationMode::Scheduled { end_date } => {
                grant.schedule_end(end_date);
                self.jobs
                    .enqueue(Job {
                        payload: JobPayload::EndSubscriptionAccess {
                            cancellation_id: cancellation.id,
                        },
                        run_at: end_date,
                    })
                    .await?;
            }
        }
        self.orders.update(&order).await?;
        Ok(None)
    }

    async fn notify(&self, cancellation: &Cancellation, kind: NotificationKind) {
        let payload = serde_json::json!({
            "order_id": cancellation.scope.order_id().to_string(),
            "reason": cancellation.decision_reason,
        });
        if let Err(err) = self
            .notifier
            .notify(&cancellation.user_id, kind, payload)
            .await
        {
            tracing::warn!(
                cancellation_id = %cancellation.id,
                error = %err,
                "notification failed"
            );
        }
    }
}
