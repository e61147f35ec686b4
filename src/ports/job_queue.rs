//! Durable delayed-job port.
//!
//! Anything that must happen later — delayed automation actions,
//! scheduled subscription endings, gateway reconciliation retries —
//! goes through here instead of holding a task alive with a sleep.
//! Jobs survive a restart; the worker that drains them retries until
//! the payload's handler succeeds.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::automation::AutomationAction;
use crate::domain::foundation::{CancellationId, DomainError, OrderId, RefundRequestId, RuleId, Timestamp};
use crate::domain::payment::TransactionId;

/// Work to perform at (or after) `run_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobPayload {
    /// Execute one automation action against an order.
    RunAutomationAction {
        rule_id: RuleId,
        order_id: OrderId,
        action: AutomationAction,
    },

    /// Re-check a payment whose gateway outcome was unknown.
    ReconcilePayment { transaction_id: TransactionId },

    /// Re-drive a refund stuck in processing.
    ReconcileRefund { refund_request_id: RefundRequestId },

    /// End subscription access for a scheduled cancellation.
    EndSubscriptionAccess { cancellation_id: CancellationId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub payload: JobPayload,
    pub run_at: Timestamp,
}

/// Port to the durable job store.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: Job) -> Result<(), DomainError>;

    /// Claims and removes every job whose `run_at` is at or before
    /// `now`, oldest first. A claimed job that fails must be
    /// re-enqueued by the worker with a later `run_at`.
    async fn drain_due(&self, now: Timestamp) -> Result<Vec<Job>, DomainError>;
}
