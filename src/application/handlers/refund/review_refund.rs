//! ReviewRefundHandler - Command handler for the manual review
//! decision on a pending refund request.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, RefundRequestId, Timestamp};
use crate::domain::refund::RefundStatus;
use crate::ports::{NotificationKind, Notifier, RefundRepository};

use super::execute_refund::{ExecuteRefundCommand, ExecuteRefundHandler};

/// Review decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone)]
pub struct ReviewRefundCommand {
    pub refund_id: RefundRequestId,
    pub decision: ReviewDecision,
    /// Reviewer identity, recorded with the decision.
    pub actor: String,
    /// Human-readable decision reason; always persisted.
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ReviewRefundResult {
    pub refund_id: RefundRequestId,
    pub status: RefundStatus,
}

pub struct ReviewRefundHandler {
    refunds: Arc<dyn RefundRepository>,
    notifier: Arc<dyn Notifier>,
    executor: Arc<ExecuteRefundHandler>,
}

impl ReviewRefundHandler {
    pub fn new(
        refunds: Arc<dyn RefundRepository>,
        notifier: Arc<dyn Notifier>,
        executor: Arc<ExecuteRefundHandler>,
    ) -> Self {
        Self {
            refunds,
            notifier,
            executor,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReviewRefundCommand,
    ) -> Result<ReviewRefundResult, DomainError> {
        let mut request = self
            .refunds
            .find_by_id(&cmd.refund_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::RefundRequestNotFound,
                    format!("Refund request {} not found", cmd.refund_id),
                )
            })?;
        let now = Timestamp::now();

        match cmd.decision {
            ReviewDecision::Approve => {
                request.approve(cmd.actor.clone(), cmd.reason.clone(), now)?;
                self.refunds.update(&request).await?;
                tracing::info!(
                    refund_id = %request.id,
                    actor = %cmd.actor,
                    "refund approved"
                );
                self.notify(&request, NotificationKind::RefundApproved).await;

                self.executor
                    .handle(ExecuteRefundCommand {
                        refund_id: request.id,
                    })
                    .await?;
            }
            ReviewDecision::Reject => {
                request.reject(cmd.actor.clone(), cmd.reason.clone(), now)?;
                self.refunds.update(&request).await?;
                tracing::info!(
                    refund_id = %request.id,
                    actor = %cmd.actor,
                    reason = %cmd.reason,
                    "refund rejected"
                );
                self.notify(&request, NotificationKind::RefundRejected).await;
            }
        }

        let status = self
            .refunds
            .find_by_id(&cmd.refund_id)
            .await?
            .map(|r| r.status)
            .unwrap_or(request.status);
        Ok(ReviewRefundResult {
            refund_id: cmd.refund_id,
            status,
        })
    }

    async fn notify(
        &self,
        request: &crate::domain::refund::RefundRequest,
        kind: NotificationKind,
    ) {
        let payload = serde_json::json!({
            "order_id": request.order_id.to_string(),
            "amount_cents": request.amount.as_cents(),
            "reason": request.decision_reason,
        });
        if let Err(err) = self.notifier.notify(&request.user_id, kind, payload).await {
            tracing::warn!(refund_id = %request.id, error = %err, "notification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gateway::MockGateway;
    use crate::adapters::memory::{
        InMemoryJobQueue, InMemoryOrderRepository, InMemoryPaymentRepository,
        InMemoryRefundRepository,
    };
    use crate::adapters::notifier::LoggingNotifier;
    use crate::domain::foundation::{Money, OrderId, PaymentId, ProductId, UserId};
    use crate::domain::order::{ItemRef, LineItem, Order, PricingSnapshot};
    use crate::domain::payment::{GatewayMetadata, Payment, PaymentStatus, TransactionId};
    use crate::domain::refund::{RefundRequest, RefundType};
    use crate::ports::{OrderRepository, PaymentRepository};

    struct Fixture {
        refunds: Arc<InMemoryRefundRepository>,
        orders: Arc<InMemoryOrderRepository>,
        payments: Arc<InMemoryPaymentRepository>,
        handler: ReviewRefundHandler,
    }

    fn fixture() -> Fixture {
        let refunds = Arc::new(InMemoryRefundRepository::new());
        let orders = Arc::new(InMemoryOrderRepository::new());
        let payments = Arc::new(InMemoryPaymentRepository::new());
        let executor = Arc::new(ExecuteRefundHandler::new(
            refunds.clone(),
            orders.clone(),
            payments.clone(),
            Arc::new(MockGateway::succeeding()),
            Arc::new(InMemoryJobQueue::new()),
            Arc::new(LoggingNotifier::new()),
        ));
        let handler = ReviewRefundHandler::new(
            refunds.clone(),
            Arc::new(LoggingNotifier::new()),
            executor,
        );
        Fixture {
            refunds,
            orders,
            payments,
            handler,
        }
    }

    async fn seed_pending_request(fx: &Fixture) -> RefundRequest {
        let items = vec![LineItem::new(
            ItemRef::product(ProductId::new()),
            "E-book",
            1,
            Money::from_cents(10_000),
            Money::from_cents(10_000),
        )
        .unwrap()];
        let pricing = PricingSnapshot::compute(&items, Money::ZERO, Money::ZERO, None, Money::ZERO);
        let now = Timestamp::now();
        let mut order = Order::create(
            OrderId::new(),
            UserId::new("user-1").unwrap(),
            items,
            pricing,
            now,
        )
        .unwrap();
        order.mark_paid(true, now).unwrap();
        let mut payment = Payment::create(
            PaymentId::new(),
            order.id,
            order.user_id.clone(),
            TransactionId::generate(now),
            order.total_amount(),
            now,
        )
        .unwrap();
        payment
            .complete(
                GatewayMetadata {
                    provider_txn_id: Some("prov-1".to_string()),
                    ..Default::default()
                },
                now,
            )
            .unwrap();
        fx.orders.save(&order).await.unwrap();
        fx.payments.create(&payment).await.unwrap();

        let request = RefundRequest::create(
            RefundRequestId::new(),
            order.id,
            order.user_id.clone(),
            RefundType::Full,
            Money::from_cents(10_000),
            vec![],
            "not satisfied",
            false,
            now,
        );
        fx.refunds.create(&request).await.unwrap();
        request
    }

    #[tokio::test]
    async fn approval_records_actor_and_executes() {
        let fx = fixture();
        let request = seed_pending_request(&fx).await;

        let result = fx
            .handler
            .handle(ReviewRefundCommand {
                refund_id: request.id,
                decision: ReviewDecision::Approve,
                actor: "admin-7".to_string(),
                reason: "verified with support".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.status, RefundStatus::Completed);
        let stored = fx.refunds.find_by_id(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.decided_by.as_deref(), Some("admin-7"));
        assert!(stored.gateway_refund_id.is_some());

        let payment = fx
            .payments
            .find_by_order(&request.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn rejection_persists_reason_and_executes_nothing() {
        let fx = fixture();
        let request = seed_pending_request(&fx).await;

        let result = fx
            .handler
            .handle(ReviewRefundCommand {
                refund_id: request.id,
                decision: ReviewDecision::Reject,
                actor: "admin-7".to_string(),
                reason: "outside our terms".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.status, RefundStatus::Rejected);
        let stored = fx.refunds.find_by_id(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.decision_reason.as_deref(), Some("outside our terms"));

        let payment = fx
            .payments
            .find_by_order(&request.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.refund_amount, Money::ZERO);
    }

    #[tokio::test]
    async fn double_decision_is_rejected() {
        let fx = fixture();
        let request = seed_pending_request(&fx).await;
        let cmd = |decision| ReviewRefundCommand {
            refund_id: request.id,
            decision,
            actor: "admin-7".to_string(),
            reason: "checked".to_string(),
        };

        fx.handler.handle(cmd(ReviewDecision::Approve)).await.unwrap();
        let err = fx.handler.handle(cmd(ReviewDecision::Reject)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let fx = fixture();
        let err = fx
            .handler
            .handle(ReviewRefundCommand {
                refund_id: RefundRequestId::new(),
                decision: ReviewDecision::Approve,
                actor: "admin-7".to_string(),
                reason: "checked".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RefundRequestNotFound);
    }
}
