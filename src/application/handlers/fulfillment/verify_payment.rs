//! VerifyPaymentHandler - Command handler for gateway verification callbacks.
//!
//! The gateway delivers completion callbacks at least once, sometimes
//! concurrently. This handler makes the whole fulfillment pipeline
//! converge to exactly-once observable effects:
//!
//! - the `pending → completed` payment transition goes through the
//!   repository's compare-and-set, so concurrent duplicates serialize
//!   and exactly one caller wins;
//! - every downstream projection (order status, entitlements, sales
//!   counters) is idempotent, so the losing caller — or a retry after
//!   a crash between the CAS and the projections — can safely re-drive
//!   them.
//!
//! A gateway outcome that is *unknown* (timeout, 5xx) fails nothing:
//! the payment stays pending and a reconciliation job re-checks later.
//! Only a definitive rejection moves the payment to `failed`.

use std::sync::Arc;

use crate::domain::automation::{TriggerContext, TriggerEvent};
use crate::domain::entitlement::{DownloadLink, LicenseKey, SubscriptionAccess};
use crate::domain::foundation::{DomainError, ErrorCode, OrderId, Timestamp};
use crate::domain::order::{ItemRef, Order};
use crate::domain::payment::{Payment, TransactionId};
use crate::ports::{
    CartStore, Catalog, CompletionClaim, FailureClaim, GatewayError, Job, JobPayload, JobQueue,
    NotificationKind, Notifier, OrderRepository, PaymentGateway, PaymentRepository, Verification,
};

use super::super::automation::AutomationEngine;

/// Delay before a reconciliation re-check of an unknown outcome.
const RECONCILE_DELAY_SECS: i64 = 300;

/// Command carrying a gateway verification callback.
#[derive(Debug, Clone)]
pub struct VerifyPaymentCommand {
    pub transaction_id: String,
    /// Raw provider callback body, forwarded to gateway verification.
    pub provider_payload: serde_json::Value,
}

/// Outcome of processing a verification callback.
#[derive(Debug, Clone)]
pub enum VerifyPaymentResult {
    /// This call completed the payment and drove fulfillment.
    Fulfilled { order_id: OrderId },
    /// The payment was already completed; projections re-checked,
    /// nothing new written.
    AlreadyProcessed { order_id: OrderId },
    /// Definitive gateway rejection; payment failed, order untouched.
    PaymentFailed { reason: String },
    /// Gateway outcome unknown; nothing changed, re-check queued.
    QueuedForReconciliation,
}

pub struct VerifyPaymentHandler {
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    catalog: Arc<dyn Catalog>,
    cart: Arc<dyn CartStore>,
    gateway: Arc<dyn PaymentGateway>,
    jobs: Arc<dyn JobQueue>,
    notifier: Arc<dyn Notifier>,
    automation: Arc<AutomationEngine>,
}

impl VerifyPaymentHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        catalog: Arc<dyn Catalog>,
        cart: Arc<dyn CartStore>,
        gateway: Arc<dyn PaymentGateway>,
        jobs: Arc<dyn JobQueue>,
        notifier: Arc<dyn Notifier>,
        automation: Arc<AutomationEngine>,
    ) -> Self {
        Self {
            orders,
            payments,
            catalog,
            cart,
            gateway,
            jobs,
            notifier,
            automation,
        }
    }

    pub async fn handle(
        &self,
        cmd: VerifyPaymentCommand,
    ) -> Result<VerifyPaymentResult, DomainError> {
        let transaction_id = TransactionId::parse(cmd.transaction_id)?;

        let payment = self
            .payments
            .find_by_transaction_id(&transaction_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::PaymentNotFound,
                    format!("No payment for transaction {}", transaction_id.as_str()),
                )
            })?;

        // Already completed: skip the gateway round-trip, make sure the
        // projections landed (covers a crash between CAS and fulfill).
        if payment.status.is_paid() {
            let order_id = payment.order_id;
            self.fulfill(&payment).await?;
            return Ok(VerifyPaymentResult::AlreadyProcessed { order_id });
        }

        match self.gateway.verify(&transaction_id, &cmd.provider_payload).await {
            Ok(Verification::Valid(metadata)) => {
                let claim = self
                    .payments
                    .complete_if_pending(&transaction_id, metadata, Timestamp::now())
                    .await?;
                match claim {
                    CompletionClaim::Completed(payment) => {
                        let order_id = payment.order_id;
                        self.fulfill(&payment).await?;
                        tracing::info!(
                            transaction_id = transaction_id.as_str(),
                            order_id = %order_id,
                            "payment verified and fulfilled"
                        );
                        Ok(VerifyPaymentResult::Fulfilled { order_id })
                    }
                    CompletionClaim::AlreadyCompleted(payment) => {
                        let order_id = payment.order_id;
                        self.fulfill(&payment).await?;
                        tracing::info!(
                            transaction_id = transaction_id.as_str(),
                            order_id = %order_id,
                            "duplicate verification callback, no new effects"
                        );
                        Ok(VerifyPaymentResult::AlreadyProcessed { order_id })
                    }
                }
            }
            Ok(Verification::Invalid { reason }) => {
                let claim = self
                    .payments
                    .fail_if_pending(&transaction_id, &reason, Timestamp::now())
                    .await?;
                if let FailureClaim::Failed(payment) = &claim {
                    self.notify(
                        payment,
                        NotificationKind::PaymentFailed,
                        serde_json::json!({ "reason": reason }),
                    )
                    .await;
                }
                tracing::warn!(
                    transaction_id = transaction_id.as_str(),
                    reason = %reason,
                    "gateway rejected payment"
                );
                Ok(VerifyPaymentResult::PaymentFailed { reason })
            }
            Err(err) if matches!(err, GatewayError::Rejected(_)) => {
                let reason = err.to_string();
                self.payments
                    .fail_if_pending(&transaction_id, &reason, Timestamp::now())
                    .await?;
                Ok(VerifyPaymentResult::PaymentFailed { reason })
            }
            Err(err) => {
                // Timeout, 5xx, or an unparseable response: the money
                // state is unclear. Never auto-fail here.
                tracing::warn!(
                    transaction_id = transaction_id.as_str(),
                    error = %err,
                    "gateway outcome unknown, queueing reconciliation"
                );
                self.jobs
                    .enqueue(Job {
                        payload: JobPayload::ReconcilePayment {
                            transaction_id: transaction_id.clone(),
                        },
                        run_at: Timestamp::now().add_secs(RECONCILE_DELAY_SECS),
                    })
                    .await?;
                Ok(VerifyPaymentResult::QueuedForReconciliation)
            }
        }
    }

    /// Drives every post-payment projection. Safe to call repeatedly
    /// for the same payment: each step is an upsert or a
    /// transaction-deduplicated increment.
    async fn fulfill(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut order = self
            .orders
            .find_by_id(&payment.order_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::OrderNotFound,
                    format!("Order {} not found", payment.order_id),
                )
            })?;
        let now = Timestamp::now();
        let first_time = !order.payment_status.is_paid();

        let all_digital = self.order_is_all_digital(&order).await?;
        order.mark_paid(all_digital, now)?;

        let mut any_digital = false;
        for line in order.items.clone() {
            match &line.item {
                ItemRef::Product { product_id } => {
                    let product =
                        self.catalog.find_product(product_id).await?.ok_or_else(|| {
                            DomainError::new(
                                ErrorCode::ProductNotFound,
                                format!("Product {} missing at fulfillment", product_id),
                            )
                        })?;
                    if let Some(digital) = &product.digital {
                        any_digital = true;
                        order.upsert_download_link(
                            DownloadLink::issue(
                                *product_id,
                                digital.file_url.clone(),
                                now,
                                digital.max_downloads,
                            ),
                            now,
                        );
                        if let Some(policy) = digital.license {
                            if let Some(key) = LicenseKey::issue(*product_id, policy, now) {
                                order.upsert_license_key(key, now);
                            }
                        }
                    }
                    self.catalog
                        .record_sale(
                            product_id,
                            &payment.transaction_id,
                            line.quantity,
                            line.line_total(),
                        )
                        .await?;
                }
                ItemRef::Subscription { plan_id } => {
                    let plan = self.catalog.find_plan(plan_id).await?.ok_or_else(|| {
                        DomainError::new(
                            ErrorCode::PlanNotFound,
                            format!("Plan {} missing at fulfillment", plan_id),
                        )
                    })?;
                    order.upsert_subscription(
                        SubscriptionAccess::grant(*plan_id, plan.billing_cycle, now),
                        now,
                    );
                    self.catalog
                        .record_subscription_sale(
                            plan_id,
                            &payment.transaction_id,
                            line.line_total(),
                        )
                        .await?;
                }
            }
        }

        self.orders.update(&order).await?;
        self.cart.clear(&order.user_id).await?;

        if first_time {
            self.notify(
                payment,
                NotificationKind::PaymentReceived,
                serde_json::json!({
                    "order_id": order.id.to_string(),
                    "amount_cents": payment.amount.as_cents(),
                }),
            )
            .await;
            if any_digital {
                self.notify(
                    payment,
                    NotificationKind::DownloadReady,
                    serde_json::json!({ "order_id": order.id.to_string() }),
                )
                .await;
            }

            let ctx = TriggerContext::new(TriggerEvent::PaymentReceived, order.id)
                .with_attribute("status", order.status.as_str());
            if let Err(err) = self.automation.fire(ctx).await {
                tracing::warn!(
                    order_id = %order.id,
                    error = %err,
                    "payment_received automation failed"
                );
            }
        }

        Ok(())
    }

    async fn order_is_all_digital(&self, order: &Order) -> Result<bool, DomainError> {
        for line in &order.items {
            if let Some(product_id) = line.item.product_id() {
                let digital = self
                    .catalog
                    .find_product(&product_id)
                    .await?
                    .map(|p| p.digital.is_some())
                    .unwrap_or(false);
                if !digital {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Best-effort notification; failures are logged, never returned.
    async fn notify(
        &self,
        payment: &Payment,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) {
        if let Err(err) = self.notifier.notify(&payment.user_id, kind, payload).await {
            tracing::warn!(
                user_id = payment.user_id.as_str(),
                kind = kind.as_str(),
                error = %err,
                "notification failed"
            );
        }
    }
}
