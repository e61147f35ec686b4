//! JobRunner - drains the durable job queue and dispatches payloads to
//! their handlers.
//!
//! Every deferred effect in the system flows through here: delayed
//! automation actions, reconciliation re-checks for unknown gateway
//! outcomes, and scheduled subscription endings. A job that fails is
//! re-enqueued with a later `run_at` rather than dropped, so transient
//! gateway or database trouble delays the effect instead of losing it.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{CancellationId, DomainError, ErrorCode, Timestamp};
use crate::ports::{CancellationRepository, Job, JobPayload, JobQueue, OrderRepository};

use super::handlers::automation::AutomationEngine;
use super::handlers::fulfillment::{VerifyPaymentCommand, VerifyPaymentHandler};
use super::handlers::refund::{ExecuteRefundCommand, ExecuteRefundHandler};

/// Backoff applied to a failed job before it runs again.
const RETRY_DELAY_SECS: i64 = 60;

pub struct JobRunner {
    jobs: Arc<dyn JobQueue>,
    orders: Arc<dyn OrderRepository>,
    cancellations: Arc<dyn CancellationRepository>,
    automation: Arc<AutomationEngine>,
    verifier: Arc<VerifyPaymentHandler>,
    refund_executor: Arc<ExecuteRefundHandler>,
}

impl JobRunner {
    pub fn new(
        jobs: Arc<dyn JobQueue>,
        orders: Arc<dyn OrderRepository>,
        cancellations: Arc<dyn CancellationRepository>,
        automation: Arc<AutomationEngine>,
        verifier: Arc<VerifyPaymentHandler>,
        refund_executor: Arc<ExecuteRefundHandler>,
    ) -> Self {
        Self {
            jobs,
            orders,
            cancellations,
            automation,
            verifier,
            refund_executor,
        }
    }

    /// Polls the queue forever. Spawned once at startup.
    pub async fn run(&self, poll_interval: Duration) {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = self.tick(Timestamp::now()).await {
                tracing::error!(error = %err, "job queue drain failed");
            }
        }
    }

    /// Drains and dispatches everything due at `now`. Returns the
    /// number of jobs that succeeded.
    pub async fn tick(&self, now: Timestamp) -> Result<u32, DomainError> {
        let due = self.jobs.drain_due(now).await?;
        let mut succeeded = 0u32;

        for job in due {
            match self.dispatch(&job.payload).await {
                Ok(()) => succeeded += 1,
                Err(err) => {
                    tracing::warn!(
                        payload = ?job.payload,
                        error = %err,
                        retry_in_secs = RETRY_DELAY_SECS,
                        "job failed, re-enqueueing"
                    );
                    self.jobs
                        .enqueue(Job {
                            payload: job.payload,
                            run_at: now.add_secs(RETRY_DELAY_SECS),
                        })
                        .await?;
                }
            }
        }

        Ok(succeeded)
    }

    async fn dispatch(&self, payload: &JobPayload) -> Result<(), DomainError> {
        match payload {
            JobPayload::RunAutomationAction {
                rule_id,
                order_id,
                action,
            } => self.automation.execute_action(rule_id, order_id, action).await,

            JobPayload::ReconcilePayment { transaction_id } => {
                // Re-verify with the provider; no callback body exists
                // for a reconciliation pass.
                self.verifier
                    .handle(VerifyPaymentCommand {
                        transaction_id: transaction_id.as_str().to_string(),
                        provider_payload: serde_json::Value::Null,
                    })
                    .await?;
                Ok(())
            }

            JobPayload::ReconcileRefund { refund_request_id } => {
                self.refund_executor
                    .handle(ExecuteRefundCommand {
                        refund_id: *refund_request_id,
                    })
                    .await?;
                Ok(())
            }

            JobPayload::EndSubscriptionAccess { cancellation_id } => {
                self.end_subscription_access(cancellation_id).await
            }
        }
    }

    /// Ends access for a scheduled subscription cancellation.
    async fn end_subscription_access(
        &self,
        cancellation_id: &CancellationId,
    ) -> Result<(), DomainError> {
        let cancellation = self
            .cancellations
            .find_by_id(cancellation_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::CancellationNotFound,
                    format!("Cancellation {} not found", cancellation_id),
                )
            })?;

        let crate::domain::refund::CancellationScope::Subscription { order_id, plan_id } =
            cancellation.scope
        else {
            // Order-scoped cancellations never schedule this job.
            return Ok(());
        };

        let mut order = self.orders.find_by_id(&order_id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::OrderNotFound, format!("Order {} not found", order_id))
        })?;
        let now = Timestamp::now();

        let Some(grant) = order.subscription_mut(plan_id) else {
            // Grant already removed; nothing left to end.
            return Ok(());
        };
        if grant.active {
            grant.end_now(now);
            order.updated_at = now;
            self.orders.update(&order).await?;
            tracing::info!(
                cancellation_id = %cancellation_id,
                order_id = %order_id,
                plan_id = %plan_id,
                "scheduled subscription end applied"
            );
        }

        Ok(())
    }
}
