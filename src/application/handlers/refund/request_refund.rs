//! RequestRefundHandler - Command handler for customer refund requests.
//!
//! Validates the request against the order's payment state and the
//! policy table, then either parks it for review or, when it clears
//! the auto-approve threshold, approves it on the spot and hands it to
//! the executor.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, Money, OrderId, RefundRequestId, Timestamp, UserId};
use crate::domain::order::ItemRef;
use crate::domain::refund::{
    ProductClass, RefundLine, RefundPolicySet, RefundRequest, RefundStatus, RefundType,
};
use crate::ports::{Catalog, NotificationKind, Notifier, OrderRepository, PaymentRepository, RefundRepository};

use super::execute_refund::{ExecuteRefundCommand, ExecuteRefundHandler};

/// Command to request a refund against an order.
#[derive(Debug, Clone)]
pub struct RequestRefundCommand {
    pub order_id: OrderId,
    pub user_id: String,
    pub refund_type: RefundType,
    /// Per-line breakdown; required for partial refunds, ignored for
    /// full ones.
    pub lines: Vec<RefundLine>,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct RequestRefundResult {
    pub refund_id: RefundRequestId,
    pub status: RefundStatus,
    pub amount: Money,
    pub auto_approved: bool,
}

pub struct RequestRefundHandler {
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    refunds: Arc<dyn RefundRepository>,
    catalog: Arc<dyn Catalog>,
    notifier: Arc<dyn Notifier>,
    policies: RefundPolicySet,
    executor: Arc<ExecuteRefundHandler>,
}

impl RequestRefundHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        refunds: Arc<dyn RefundRepository>,
        catalog: Arc<dyn Catalog>,
        notifier: Arc<dyn Notifier>,
        policies: RefundPolicySet,
        executor: Arc<ExecuteRefundHandler>,
    ) -> Self {
        Self {
            orders,
            payments,
            refunds,
            catalog,
            notifier,
            policies,
            executor,
        }
    }

    pub async fn handle(
        &self,
        cmd: RequestRefundCommand,
    ) -> Result<RequestRefundResult, DomainError> {
        let user_id = UserId::new(cmd.user_id)?;
        let now = Timestamp::now();

        let order = self
            .orders
            .find_by_id(&cmd.order_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::OrderNotFound,
                    format!("Order {} not found", cmd.order_id),
                )
            })?;
        let payment = self
            .payments
            .find_by_order(&cmd.order_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::PaymentNotFound,
                    format!("No payment for order {}", cmd.order_id),
                )
            })?;
        if !payment.status.is_paid() && payment.refund_amount.is_zero() {
            return Err(DomainError::new(
                ErrorCode::NotPaid,
                "Only paid orders can be refunded",
            ));
        }

        let refundable = payment.refundable_amount();
        if refundable.is_zero() {
            return Err(DomainError::new(
                ErrorCode::RefundExceedsRefundable,
                "Order is already fully refunded",
            ));
        }

        // Resolve the most restrictive policy across the order's
        // product classes.
        let classes = self.order_classes(&order).await?;
        let policy = self.policies.effective(&classes).ok_or_else(|| {
            DomainError::new(
                ErrorCode::RefundWindowClosed,
                "No refund policy covers the items on this order",
            )
        })?;

        if order.age_in_days(now) > policy.refund_window_days {
            return Err(DomainError::new(
                ErrorCode::RefundWindowClosed,
                format!(
                    "Refund window of {} days has passed",
                    policy.refund_window_days
                ),
            ));
        }

        let (amount, lines) = match cmd.refund_type {
            RefundType::Full => (refundable, Vec::new()),
            RefundType::Partial => {
                if !policy.allow_partial_refunds {
                    return Err(DomainError::new(
                        ErrorCode::PartialRefundNotAllowed,
                        "Partial refunds are not allowed for these items",
                    ));
                }
                if cmd.lines.is_empty() {
                    return Err(DomainError::validation(
                        "lines",
                        "Partial refund requires a per-line breakdown",
                    ));
                }
                let amount: Money = cmd.lines.iter().map(|l| l.amount).sum();
                if amount.is_zero() || amount.is_negative() {
                    return Err(DomainError::validation(
                        "lines",
                        "Refund amount must be positive",
                    ));
                }
                (amount, cmd.lines)
            }
        };
        if amount > refundable {
            return Err(DomainError::new(
                ErrorCode::RefundExceedsRefundable,
                format!("Requested {} exceeds refundable {}", amount, refundable),
            ));
        }

        let auto_approved = amount <= policy.auto_approve_threshold;
        let request = RefundRequest::create(
            RefundRequestId::new(),
            order.id,
            user_id.clone(),
            cmd.refund_type,
            amount,
            lines,
            cmd.reason,
            auto_approved,
            now,
        );
        self.refunds.create(&request).await?;

        tracing::info!(
            refund_id = %request.id,
            order_id = %order.id,
            amount = %amount,
            auto_approved,
            "refund requested"
        );
        if let Err(err) = self
            .notifier
            .notify(
                &user_id,
                NotificationKind::RefundRequested,
                serde_json::json!({
                    "order_id": order.id.to_string(),
                    "amount_cents": amount.as_cents(),
                    "auto_approved": auto_approved,
                }),
            )
            .await
        {
            tracing::warn!(refund_id = %request.id, error = %err, "notification failed");
        }

        let mut status = request.status;
        if auto_approved {
            // Pre-approved requests go straight to execution; an
            // unknown gateway outcome leaves them processing for the
            // reconciliation job.
            self.executor
                .handle(ExecuteRefundCommand {
                    refund_id: request.id,
                })
                .await?;
            if let Some(updated) = self.refunds.find_by_id(&request.id).await? {
                status = updated.status;
            }
        }

        Ok(RequestRefundResult {
            refund_id: request.id,
            status,
            amount,
            auto_approved,
        })
    }

    async fn order_classes(
        &self,
        order: &crate::domain::order::Order,
    ) -> Result<Vec<ProductClass>, DomainError> {
        let mut classes = Vec::with_capacity(order.items.len());
        for line in &order.items {
            match &line.item {
                ItemRef::Product { product_id } => {
                    let product =
                        self.catalog.find_product(product_id).await?.ok_or_else(|| {
                            DomainError::new(
                                ErrorCode::ProductNotFound,
                                format!("Product {} not found", product_id),
                            )
                        })?;
                    classes.push(product.class());
                }
                ItemRef::Subscription { .. } => classes.push(ProductClass::Subscription),
            }
        }
        Ok(classes)
    }
}
