//! ExecuteBulkHandler - Command handler for administrative batch
//! operations over many orders.
//!
//! A bulk operation is all-or-nothing for order state: every target id
//! must resolve to an order and every per-order mutation must be
//! legal, otherwise nothing is written. The surviving write goes
//! through the repository's atomic multi-order update.
//!
//! Refunds spawned by a bulk cancel (or a bulk refund) run after the
//! batch write: gateway calls cannot be made atomic with the local
//! write, so each refund settles individually through the refund
//! engine's own states.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::automation::{TriggerContext, TriggerEvent};
use crate::domain::foundation::{
    BulkOperationId, DomainError, ErrorCode, OrderId, RefundRequestId, Timestamp,
};
use crate::domain::order::{Order, OrderPriority, OrderStatus};
use crate::domain::payment::Payment;
use crate::domain::refund::{RefundRequest, RefundType};
use crate::ports::{OrderRepository, PaymentRepository, RefundRepository};

use super::super::automation::AutomationEngine;
use super::super::refund::{ExecuteRefundCommand, ExecuteRefundHandler};

/// What to do to every target order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum BulkOperation {
    UpdateStatus {
        status: OrderStatus,
        note: Option<String>,
    },
    SetPriority {
        priority: OrderPriority,
    },
    Cancel {
        reason: String,
        /// Also refund paid targets.
        refund: bool,
    },
    Refund {
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ExecuteBulkCommand {
    pub operation: BulkOperation,
    pub order_ids: Vec<OrderId>,
    pub actor: String,
}

#[derive(Debug, Clone)]
pub struct ExecuteBulkResult {
    pub bulk_id: BulkOperationId,
    pub orders_updated: usize,
    /// Refund requests spawned by cancel-with-refund or bulk refund.
    pub refunds_spawned: Vec<RefundRequestId>,
}

pub struct ExecuteBulkHandler {
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    refunds: Arc<dyn RefundRepository>,
    automation: Arc<AutomationEngine>,
    executor: Arc<ExecuteRefundHandler>,
}

impl ExecuteBulkHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        refunds: Arc<dyn RefundRepository>,
        automation: Arc<AutomationEngine>,
        executor: Arc<ExecuteRefundHandler>,
    ) -> Self {
        Self {
            orders,
            payments,
            refunds,
            automation,
            executor,
        }
    }

    pub async fn handle(&self, cmd: ExecuteBulkCommand) -> Result<ExecuteBulkResult, DomainError> {
        if cmd.order_ids.is_empty() {
            return Err(DomainError::validation("order_ids", "No target orders given"));
        }
        let bulk_id = BulkOperationId::new();
        let now = Timestamp::now();

        // Resolve every target; one missing id aborts the whole batch.
        let mut orders = self.orders.find_many(&cmd.order_ids).await?;
        if orders.len() != cmd.order_ids.len() {
            let missing: Vec<String> = cmd
                .order_ids
                .iter()
                .filter(|id| !orders.iter().any(|o| &o.id == *id))
                .map(|id| id.to_string())
                .collect();
            return Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Bulk operation aborted, unknown orders: {}", missing.join(", ")),
            )
            .with_detail("missing", missing.join(",")));
        }

        // Stage every mutation in memory; the first illegal one aborts
        // before anything is written.
        let mut refund_targets: Vec<(OrderId, Payment)> = Vec::new();
        match &cmd.operation {
            BulkOperation::UpdateStatus { status, note } => {
                for order in orders.iter_mut() {
                    order.transition(*status, note.clone(), &cmd.actor, now)?;
                }
            }
            BulkOperation::SetPriority { priority } => {
                for order in orders.iter_mut() {
                    order.set_priority(*priority, now);
                }
            }
            BulkOperation::Cancel { reason, refund } => {
                for order in orders.iter_mut() {
                    order.cancel(Some(reason.clone()), &cmd.actor, now)?;
                }
                if *refund {
                    refund_targets = self.refundable_targets(&orders).await?;
                }
            }
            BulkOperation::Refund { .. } => {
                refund_targets = self.refundable_targets(&orders).await?;
                if refund_targets.len() != orders.len() {
                    return Err(DomainError::new(
                        ErrorCode::NotPaid,
                        "Bulk refund aborted, not every target has refundable payment",
                    ));
                }
            }
        }

        let orders_updated = match &cmd.operation {
            // Pure refund batches write no order state here; the
            // refund engine updates each order as refunds complete.
            BulkOperation::Refund { .. } => orders.len(),
            _ => {
                self.orders.update_all(&orders).await?;
                orders.len()
            }
        };

        tracing::info!(
            bulk_id = %bulk_id,
            operation = ?operation_kind(&cmd.operation),
            targets = orders_updated,
            actor = %cmd.actor,
            "bulk operation applied"
        );

        // Status-changing batches feed the automation engine per order.
        if let BulkOperation::UpdateStatus { status, .. } = &cmd.operation {
            for order in &orders {
                let ctx = TriggerContext::new(TriggerEvent::StatusChanged, order.id)
                    .with_attribute("status", status.as_str());
                if let Err(err) = self.automation.fire(ctx).await {
                    tracing::warn!(order_id = %order.id, error = %err, "automation failed");
                }
            }
        }

        let reason = match &cmd.operation {
            BulkOperation::Cancel { reason, .. } | BulkOperation::Refund { reason } => {
                reason.clone()
            }
            _ => String::new(),
        };
        let mut refunds_spawned = Vec::with_capacity(refund_targets.len());
        for (order_id, payment) in refund_targets {
            let request = RefundRequest::create(
                RefundRequestId::new(),
                order_id,
                payment.user_id.clone(),
                RefundType::Full,
                payment.refundable_amount(),
                vec![],
                format!("bulk ({}): {}", bulk_id, reason),
                true,
                now,
            );
            self.refunds.create(&request).await?;
            refunds_spawned.push(request.id);

            if let Err(err) = self
                .executor
                .handle(ExecuteRefundCommand {
                    refund_id: request.id,
                })
                .await
            {
                tracing::warn!(
                    bulk_id = %bulk_id,
                    order_id = %order_id,
                    refund_id = %request.id,
                    error = %err,
                    "bulk-spawned refund execution failed"
                );
            }
        }

        Ok(ExecuteBulkResult {
            bulk_id,
            orders_updated,
            refunds_spawned,
        })
    }

    /// Targets whose payment still has refundable money on it.
    async fn refundable_targets(
        &self,
        orders: &[Order],
    ) -> Result<Vec<(OrderId, Payment)>, DomainError> {
        let mut targets = Vec::new();
        for order in orders {
            if let Some(payment) = self.payments.find_by_order(&order.id).await? {
                if payment.status.is_paid() && !payment.refundable_amount().is_zero() {
                    targets.push((order.id, payment));
                }
            }
        }
        Ok(targets)
    }
}

fn operation_kind(op: &BulkOperation) -> &'static str {
    match op {
        BulkOperation::UpdateStatus { .. } => "update_status",
        BulkOperation::SetPriority { .. } => "set_priority",
        BulkOperation::Cancel { .. } => "cancel",
        BulkOperation::Refund { .. } => "refund",
    }
}
