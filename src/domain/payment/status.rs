//! Payment lifecycle status.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Payment record status.
///
/// `Pending → Completed | Failed | Cancelled`;
/// `Completed → PartiallyRefunded → Refunded`. A definitively failed
/// payment may return to `Pending` when the customer re-initiates
/// checkout for the same order (the payment record is one-to-one with
/// the order, so retries reuse it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
    PartiallyRefunded,
    Refunded,
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Failed, Pending)
                | (Completed, PartiallyRefunded)
                | (Completed, Refunded)
                | (PartiallyRefunded, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Completed, Failed, Cancelled],
            Failed => vec![Pending],
            Completed => vec![PartiallyRefunded, Refunded],
            PartiallyRefunded => vec![Refunded],
            Cancelled | Refunded => vec![],
        }
    }
}

impl PaymentStatus {
    /// Whether money has been captured (and possibly partially returned).
    pub fn is_paid(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::PartiallyRefunded
        )
    }

    /// Returns the lowercase wire name, matching the persisted format.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::PartiallyRefunded => "partially_refunded",
            PaymentStatus::Refunded => "refunded",
        }
    }
}
