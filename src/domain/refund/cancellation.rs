//! Cancellation aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CancellationId, DomainError, ErrorCode, OrderId, PlanId, RefundRequestId, StateMachine,
    Timestamp, UserId,
};

/// Cancellation lifecycle: `Requested → Approved | Rejected`;
/// `Approved → Processed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationStatus {
    Requested,
    Approved,
    Rejected,
    Processed,
}

impl StateMachine for CancellationStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use CancellationStatus::*;
        matches!(
            (self, target),
            (Requested, Approved) | (Requested, Rejected) | (Approved, Processed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use CancellationStatus::*;
        match self {
            Requested => vec![Approved, Rejected],
            Approved => vec![Processed],
            Rejected | Processed => vec![],
        }
    }
}

impl CancellationStatus {
    /// Returns the lowercase wire name, matching the persisted format.
    pub fn as_str(&self) -> &'static str {
        match self {
            CancellationStatus::Requested => "requested",
            CancellationStatus::Approved => "approved",
            CancellationStatus::Rejected => "rejected",
            CancellationStatus::Processed => "processed",
        }
    }
}

/// When a subscription cancellation takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CancellationMode {
    /// End access now and deactivate the grant.
    Immediate,
    /// Disable auto-renew only; access runs to the current period end.
    EndOfPeriod,
    /// Disable auto-renew and set a specific future end date.
    Scheduled { end_date: Timestamp },
}

/// What is being cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum CancellationScope {
    /// Cancel the whole order.
    Order { order_id: OrderId },
    /// Cancel one subscription grant on an order.
    Subscription { order_id: OrderId, plan_id: PlanId },
}

impl CancellationScope {
    pub fn order_id(&self) -> OrderId {
        match self {
            CancellationScope::Order { order_id } => *order_id,
            CancellationScope::Subscription { order_id, .. } => *order_id,
        }
    }
}

/// Cancellation aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cancellation {
    pub id: CancellationId,
    pub scope: CancellationScope,
    pub user_id: UserId,
    pub status: CancellationStatus,
    pub mode: CancellationMode,

    /// Customer-supplied reason.
    pub request_reason: String,

    /// Reason recorded with the approve/reject decision.
    pub decision_reason: Option<String>,
    pub decided_by: Option<String>,

    /// Refund request spawned on approval, when the order was
    /// refund-eligible. Created pre-approved; no second review.
    pub spawned_refund: Option<RefundRequestId>,

    pub requested_at: Timestamp,
    pub decided_at: Option<Timestamp>,
    pub processed_at: Option<Timestamp>,
}

impl Cancellation {
    /// Records a new cancellation request.
    pub fn request(
        id: CancellationId,
        scope: CancellationScope,
        user_id: UserId,
        mode: CancellationMode,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            scope,
            user_id,
            status: CancellationStatus::Requested,
            mode,
            request_reason: reason.into(),
            decision_reason: None,
            decided_by: None,
            spawned_refund: None,
            requested_at: now,
            decided_at: None,
            processed_at: None,
        }
    }

    /// Approves the request, optionally linking a spawned refund.
    pub fn approve(
        &mut self,
        actor: impl Into<String>,
        reason: impl Into<String>,
        spawned_refund: Option<RefundRequestId>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition(CancellationStatus::Approved)?;
        self.decided_by = Some(actor.into());
        self.decision_reason = Some(reason.into());
        self.spawned_refund = spawned_refund;
        self.decided_at = Some(now);
        Ok(())
    }

    /// Rejects the request; the reason is always persisted.
    pub fn reject(
        &mut self,
        actor: impl Into<String>,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition(CancellationStatus::Rejected)?;
        self.decided_by = Some(actor.into());
        self.decision_reason = Some(reason.into());
        self.decided_at = Some(now);
        Ok(())
    }

    /// Marks the approved cancellation as executed.
    pub fn mark_processed(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition(CancellationStatus::Processed)?;
        self.processed_at = Some(now);
        Ok(())
    }

    fn transition(&mut self, target: CancellationStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot transition cancellation from {:?} to {:?}", self.status, target),
            )
        })?;
        Ok(())
    }
}
