//! Refund request aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, Money, OrderId, ProductId, RefundRequestId, StateMachine, Timestamp,
    UserId,
};

/// Refund request lifecycle.
///
/// `Pending → Approved | Rejected`; `Approved → Processing →
/// Completed | Failed`. A failed execution may be retried
/// (`Failed → Processing`) once the gateway issue is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Approved,
    Rejected,
    Processing,
    Completed,
    Failed,
}

impl StateMachine for RefundStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use RefundStatus::*;
        matches!(
            (self, target),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Failed, Processing)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use RefundStatus::*;
        match self {
            Pending => vec![Approved, Rejected],
            Approved => vec![Processing],
            Processing => vec![Completed, Failed],
            Failed => vec![Processing],
            Rejected | Completed => vec![],
        }
    }
}

impl RefundStatus {
    /// Returns the lowercase wire name, matching the persisted format.
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Approved => "approved",
            RefundStatus::Rejected => "rejected",
            RefundStatus::Processing => "processing",
            RefundStatus::Completed => "completed",
            RefundStatus::Failed => "failed",
        }
    }
}

/// Full or partial refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundType {
    Full,
    Partial,
}

/// Per-line amount breakdown for partial refunds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundLine {
    pub product_id: ProductId,
    pub amount: Money,
}

/// Refund request aggregate.
///
/// # Invariants
///
/// - `amount > 0` and never exceeds the order's refundable amount at
///   creation time (re-checked at execution time)
/// - partial requests carry a line breakdown summing to `amount`
/// - every decision (approve/reject) records a human-readable reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub id: RefundRequestId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub refund_type: RefundType,
    pub amount: Money,
    pub lines: Vec<RefundLine>,
    pub status: RefundStatus,

    /// Customer-supplied reason for the request.
    pub request_reason: String,

    /// Reason recorded with the approve/reject decision or failure.
    pub decision_reason: Option<String>,

    /// Who decided (admin id, or "system" for auto-approval).
    pub decided_by: Option<String>,

    /// Gateway refund reference, set on completion. Stable persisted
    /// field.
    pub gateway_refund_id: Option<String>,

    /// Raw gateway response for the executed refund.
    pub gateway_response: Option<serde_json::Value>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RefundRequest {
    /// Creates a request that has passed eligibility checks.
    ///
    /// When `auto_approve` is set the request starts life `Approved`
    /// with a system decision note, skipping manual review.
    pub fn create(
        id: RefundRequestId,
        order_id: OrderId,
        user_id: UserId,
        refund_type: RefundType,
        amount: Money,
        lines: Vec<RefundLine>,
        request_reason: impl Into<String>,
        auto_approve: bool,
        now: Timestamp,
    ) -> Self {
        let (status, decision_reason, decided_by) = if auto_approve {
            (
                RefundStatus::Approved,
                Some("auto-approved under policy threshold".to_string()),
                Some("system".to_string()),
            )
        } else {
            (RefundStatus::Pending, None, None)
        };
        Self {
            id,
            order_id,
            user_id,
            refund_type,
            amount,
            lines,
            status,
            request_reason: request_reason.into(),
            decision_reason,
            decided_by,
            gateway_refund_id: None,
            gateway_response: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Approves a pending request.
    pub fn approve(
        &mut self,
        actor: impl Into<String>,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition(RefundStatus::Approved)?;
        self.decided_by = Some(actor.into());
        self.decision_reason = Some(reason.into());
        self.updated_at = now;
        Ok(())
    }

    /// Rejects a pending request; the reason is always persisted.
    pub fn reject(
        &mut self,
        actor: impl Into<String>,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition(RefundStatus::Rejected)?;
        self.decided_by = Some(actor.into());
        self.decision_reason = Some(reason.into());
        self.updated_at = now;
        Ok(())
    }

    /// Moves an approved (or previously failed) request into execution.
    pub fn begin_processing(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition(RefundStatus::Processing)?;
        self.updated_at = now;
        Ok(())
    }

    /// Records a successful gateway refund.
    pub fn complete(
        &mut self,
        gateway_refund_id: impl Into<String>,
        gateway_response: serde_json::Value,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition(RefundStatus::Completed)?;
        self.gateway_refund_id = Some(gateway_refund_id.into());
        self.gateway_response = Some(gateway_response);
        self.updated_at = now;
        Ok(())
    }

    /// Records a definitive gateway failure.
    pub fn fail(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), DomainError> {
        self.transition(RefundStatus::Failed)?;
        self.decision_reason = Some(reason.into());
        self.updated_at = now;
        Ok(())
    }

    fn transition(&mut self, target: RefundStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot transition refund request from {:?} to {:?}", self.status, target),
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(auto_approve: bool) -> RefundRequest {
        RefundRequest::create(
            RefundRequestId::new(),
            OrderId::new(),
            UserId::new("user-1").unwrap(),
            RefundType::Full,
            Money::from_cents(4_000),
            vec![],
            "item not as described",
            auto_approve,
            Timestamp::now(),
        )
    }

    #[test]
    fn manual_request_starts_pending() {
        let r = request(false);
        assert_eq!(r.status, RefundStatus::Pending);
        assert!(r.decision_reason.is_none());
    }

    #[test]
    fn auto_approved_request_skips_review() {
        let r = request(true);
        assert_eq!(r.status, RefundStatus::Approved);
        assert_eq!(r.decided_by.as_deref(), Some("system"));
        assert!(r.decision_reason.is_some());
    }

    #[test]
    fn reject_persists_actor_and_reason() {
        let mut r = request(false);
        r.reject("admin-7", "outside store policy", Timestamp::now()).unwrap();
        assert_eq!(r.status, RefundStatus::Rejected);
        assert_eq!(r.decided_by.as_deref(), Some("admin-7"));
        assert_eq!(r.decision_reason.as_deref(), Some("outside store policy"));
    }

    #[test]
    fn rejected_request_is_terminal() {
        let mut r = request(false);
        r.reject("admin-7", "no", Timestamp::now()).unwrap();
        assert!(r.begin_processing(Timestamp::now()).is_err());
        assert!(r.status.is_terminal());
    }

    #[test]
    fn execution_happy_path() {
        let mut r = request(true);
        r.begin_processing(Timestamp::now()).unwrap();
        r.complete("grf_123", serde_json::json!({"ok": true}), Timestamp::now())
            .unwrap();
        assert_eq!(r.status, RefundStatus::Completed);
        assert_eq!(r.gateway_refund_id.as_deref(), Some("grf_123"));
    }

    #[test]
    fn failed_execution_may_retry() {
        let mut r = request(true);
        r.begin_processing(Timestamp::now()).unwrap();
        r.fail("gateway rejected refund", Timestamp::now()).unwrap();
        assert_eq!(r.status, RefundStatus::Failed);

        r.begin_processing(Timestamp::now()).unwrap();
        assert_eq!(r.status, RefundStatus::Processing);
    }

    #[test]
    fn cannot_process_without_approval() {
        let mut r = request(false);
        assert!(r.begin_processing(Timestamp::now()).is_err());
    }
}
