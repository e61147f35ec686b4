//! ExecuteRefundHandler - Command handler that moves approved refunds
//! through the gateway.
//!
//! The gateway call is the one step that can move money twice, so its
//! outcome handling is strict: success records the provider refund id
//! and updates Order and Payment together; a definitive rejection
//! fails the request and touches nothing else; an unknown outcome
//! (timeout, 5xx) leaves the request `processing` and queues a
//! reconciliation job instead of retrying blindly.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, RefundRequestId, Timestamp};
use crate::domain::refund::RefundStatus;
use crate::ports::{
    GatewayError, Job, JobPayload, JobQueue, NotificationKind, Notifier, OrderRepository,
    PaymentGateway, PaymentRepository, RefundRepository,
};

/// Delay before a reconciliation re-check of an unknown refund outcome.
const RECONCILE_DELAY_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct ExecuteRefundCommand {
    pub refund_id: RefundRequestId,
}

#[derive(Debug, Clone)]
pub enum ExecuteRefundResult {
    /// Gateway refund succeeded and all records were updated.
    Completed { fully_refunded: bool },
    /// Definitive gateway rejection; the request is `failed`.
    Failed { reason: String },
    /// Gateway outcome unknown; request stays `processing`, re-check
    /// queued.
    QueuedForReconciliation,
}

pub struct ExecuteRefundHandler {
    refunds: Arc<dyn RefundRepository>,
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    jobs: Arc<dyn JobQueue>,
    notifier: Arc<dyn Notifier>,
}

impl ExecuteRefundHandler {
    pub fn new(
        refunds: Arc<dyn RefundRepository>,
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        jobs: Arc<dyn JobQueue>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            refunds,
            orders,
            payments,
            gateway,
            jobs,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: ExecuteRefundCommand,
    ) -> Result<ExecuteRefundResult, DomainError> {
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

        match request.status {
            RefundStatus::Approved | RefundStatus::Failed => {
                request.begin_processing(now)?;
                self.refunds.update(&request).await?;
            }
            // A reconciliation retry finds the request already
            // processing; proceed without a second transition.
            RefundStatus::Processing => {}
            other => {
                return Err(DomainError::invalid_state(format!(
                    "Refund request {} is {:?}, not executable",
                    request.id, other
                )));
            }
        }

        let mut payment = self
            .payments
            .find_by_order(&request.order_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::PaymentNotFound,
                    format!("No payment for order {}", request.order_id),
                )
            })?;

        // Refundable may have shrunk since approval.
        if request.amount > payment.refundable_amount() {
            let reason = format!(
                "Requested {} exceeds refundable {}",
                request.amount,
                payment.refundable_amount()
            );
            request.fail(reason.clone(), now)?;
            self.refunds.update(&request).await?;
            return Ok(ExecuteRefundResult::Failed { reason });
        }

        let provider_txn = payment
            .gateway
            .provider_txn_id
            .clone()
            .unwrap_or_else(|| payment.transaction_id.as_str().to_string());

        match self.gateway.refund(&provider_txn, request.amount).await {
            Ok(refund) => {
                request.complete(refund.provider_refund_id, refund.response, now)?;
                self.refunds.update(&request).await?;

                let fully_refunded = payment.apply_refund(request.amount, now)?;
                self.payments.update(&payment).await?;

                let mut order = self
                    .orders
                    .find_by_id(&request.order_id)
                    .await?
                    .ok_or_else(|| {
                        DomainError::new(
                            ErrorCode::OrderNotFound,
                            format!("Order {} not found", request.order_id),
                        )
                    })?;
                order.apply_refund(fully_refunded, now)?;
                self.orders.update(&order).await?;

                tracing::info!(
                    refund_id = %request.id,
                    order_id = %request.order_id,
                    amount = %request.amount,
                    fully_refunded,
                    "refund executed"
                );
                if let Err(err) = self
                    .notifier
                    .notify(
                        &request.user_id,
                        NotificationKind::RefundCompleted,
                        serde_json::json!({
                            "order_id": request.order_id.to_string(),
                            "amount_cents": request.amount.as_cents(),
                        }),
                    )
                    .await
                {
                    tracing::warn!(refund_id = %request.id, error = %err, "notification failed");
                }

                Ok(ExecuteRefundResult::Completed { fully_refunded })
            }
            Err(GatewayError::Rejected(reason)) => {
                request.fail(reason.clone(), now)?;
                self.refunds.update(&request).await?;
                tracing::warn!(
                    refund_id = %request.id,
                    reason = %reason,
                    "gateway rejected refund"
                );
                Ok(ExecuteRefundResult::Failed { reason })
            }
            Err(err) => {
                tracing::warn!(
                    refund_id = %request.id,
                    error = %err,
                    "refund outcome unknown, queueing reconciliation"
                );
                self.jobs
                    .enqueue(Job {
                        payload: JobPayload::ReconcileRefund {
                            refund_request_id: request.id,
                        },
                        run_at: now.add_secs(RECONCILE_DELAY_SECS),
                    })
                    .await?;
                Ok(ExecuteRefundResult::QueuedForReconciliation)
            }
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
    use crate::domain::order::{ItemRef, LineItem, Order, OrderStatus, PricingSnapshot};
    use crate::domain::payment::{GatewayMetadata, Payment, PaymentStatus, TransactionId};
    use crate::domain::refund::{RefundRequest, RefundType};

    struct Fixture {
        refunds: Arc<InMemoryRefundRepository>,
        orders: Arc<InMemoryOrderRepository>,
        payments: Arc<InMemoryPaymentRepository>,
        jobs: Arc<InMemoryJobQueue>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                refunds: Arc::new(InMemoryRefundRepository::new()),
                orders: Arc::new(InMemoryOrderRepository::new()),
                payments: Arc::new(InMemoryPaymentRepository::new()),
                jobs: Arc::new(InMemoryJobQueue::new()),
            }
        }

        fn handler(&self, gateway: MockGateway) -> ExecuteRefundHandler {
            ExecuteRefundHandler::new(
                self.refunds.clone(),
                self.orders.clone(),
                self.payments.clone(),
                Arc::new(gateway),
                self.jobs.clone(),
                Arc::new(LoggingNotifier::new()),
            )
        }

        /// Paid 100.00 order with a completed payment.
        async fn seed_paid_order(&self) -> Order {
            let items = vec![LineItem::new(
                ItemRef::product(ProductId::new()),
                "E-book",
                1,
                Money::from_cents(10_000),
                Money::from_cents(10_000),
            )
            .unwrap()];
            let pricing =
                PricingSnapshot::compute(&items, Money::ZERO, Money::ZERO, None, Money::ZERO);
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

            self.orders.save(&order).await.unwrap();
            self.payments.create(&payment).await.unwrap();
            order
        }

        async fn approved_request(&self, order: &Order, cents: i64, full: bool) -> RefundRequest {
            let request = RefundRequest::create(
                RefundRequestId::new(),
                order.id,
                order.user_id.clone(),
                if full { RefundType::Full } else { RefundType::Partial },
                Money::from_cents(cents),
                vec![],
                "changed my mind",
                true, // created pre-approved
                Timestamp::now(),
            );
            self.refunds.create(&request).await.unwrap();
            request
        }
    }

    #[tokio::test]
    async fn refund_ladder_40_then_60_fully_refunds() {
        let fx = Fixture::new();
        let order = fx.seed_paid_order().await;
        let handler = fx.handler(MockGateway::succeeding());

        let first = fx.approved_request(&order, 4_000, false).await;
        let result = handler
            .handle(ExecuteRefundCommand { refund_id: first.id })
            .await
            .unwrap();
        assert!(matches!(result, ExecuteRefundResult::Completed { fully_refunded: false }));

        let payment = fx.payments.find_by_order(&order.id).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::PartiallyRefunded);
        assert_eq!(payment.refundable_amount(), Money::from_cents(6_000));
        let stored = fx.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Completed);
        assert_eq!(stored.payment_status, PaymentStatus::PartiallyRefunded);

        let second = fx.approved_request(&order, 6_000, false).await;
        let result = handler
            .handle(ExecuteRefundCommand { refund_id: second.id })
            .await
            .unwrap();
        assert!(matches!(result, ExecuteRefundResult::Completed { fully_refunded: true }));

        let payment = fx.payments.find_by_order(&order.id).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Refunded);
        assert_eq!(payment.refundable_amount(), Money::ZERO);
        let stored = fx.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Refunded);
        assert_eq!(stored.payment_status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn execution_recheck_catches_shrunk_refundable() {
        let fx = Fixture::new();
        let order = fx.seed_paid_order().await;
        let handler = fx.handler(MockGateway::succeeding());

        // Both approved against the same 100.00; the second can no
        // longer be covered after the first completes.
        let a = fx.approved_request(&order, 8_000, false).await;
        let b = fx.approved_request(&order, 8_000, false).await;

        handler.handle(ExecuteRefundCommand { refund_id: a.id }).await.unwrap();
        let result = handler.handle(ExecuteRefundCommand { refund_id: b.id }).await.unwrap();
        assert!(matches!(result, ExecuteRefundResult::Failed { .. }));

        let stored = fx.refunds.find_by_id(&b.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RefundStatus::Failed);
        let payment = fx.payments.find_by_order(&order.id).await.unwrap().unwrap();
        assert_eq!(payment.refund_amount, Money::from_cents(8_000));
    }

    #[tokio::test]
    async fn gateway_rejection_fails_request_and_touches_nothing_else() {
        let fx = Fixture::new();
        let order = fx.seed_paid_order().await;
        let handler = fx.handler(MockGateway::refund_rejecting("already refunded upstream"));

        let request = fx.approved_request(&order, 10_000, true).await;
        let result = handler
            .handle(ExecuteRefundCommand { refund_id: request.id })
            .await
            .unwrap();
        assert!(matches!(result, ExecuteRefundResult::Failed { .. }));

        let stored = fx.refunds.find_by_id(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RefundStatus::Failed);
        assert_eq!(
            stored.decision_reason.as_deref(),
            Some("already refunded upstream")
        );

        let payment = fx.payments.find_by_order(&order.id).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.refund_amount, Money::ZERO);
        let stored_order = fx.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored_order.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn unknown_outcome_keeps_request_processing_and_queues_recheck() {
        let fx = Fixture::new();
        let order = fx.seed_paid_order().await;
        let handler = fx.handler(MockGateway::timing_out());

        let request = fx.approved_request(&order, 5_000, false).await;
        let result = handler
            .handle(ExecuteRefundCommand { refund_id: request.id })
            .await
            .unwrap();
        assert!(matches!(result, ExecuteRefundResult::QueuedForReconciliation));

        let stored = fx.refunds.find_by_id(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RefundStatus::Processing);

        let due = fx
            .jobs
            .drain_due(Timestamp::now().add_secs(600))
            .await
            .unwrap();
        assert!(matches!(due[0].payload, JobPayload::ReconcileRefund { .. }));

        // The reconciliation retry re-enters while processing.
        let handler = fx.handler(MockGateway::succeeding());
        let result = handler
            .handle(ExecuteRefundCommand { refund_id: request.id })
            .await
            .unwrap();
        assert!(matches!(result, ExecuteRefundResult::Completed { .. }));
    }

    #[tokio::test]
    async fn pending_request_is_not_executable() {
        let fx = Fixture::new();
        let order = fx.seed_paid_order().await;
        let handler = fx.handler(MockGateway::succeeding());

        let request = RefundRequest::create(
            RefundRequestId::new(),
            order.id,
            order.user_id.clone(),
            RefundType::Full,
            Money::from_cents(10_000),
            vec![],
            "changed my mind",
            false,
            Timestamp::now(),
        );
        fx.refunds.create(&request).await.unwrap();

        let err = handler
            .handle(ExecuteRefundCommand { refund_id: request.id })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }
}
