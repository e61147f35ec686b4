//! Order lifecycle status and priority.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Order fulfillment status.
///
/// Forward path is `Pending → Processing → Shipped → Delivered →
/// Completed`. All-digital orders have nothing to ship and may jump
/// straight to `Completed` once paid. Any non-terminal status can be
/// cancelled; delivered or completed orders can be refunded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Processing)
                | (Pending, Completed)
                | (Processing, Shipped)
                | (Processing, Completed)
                | (Shipped, Delivered)
                | (Delivered, Completed)
                | (Delivered, Refunded)
                | (Completed, Refunded)
                | (Pending, Cancelled)
                | (Processing, Cancelled)
                | (Shipped, Cancelled)
                | (Delivered, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Pending => vec![Processing, Completed, Cancelled],
            Processing => vec![Shipped, Completed, Cancelled],
            Shipped => vec![Delivered, Cancelled],
            Delivered => vec![Completed, Refunded, Cancelled],
            Completed => vec![Refunded],
            Cancelled | Refunded => vec![],
        }
    }
}

impl OrderStatus {
    /// Returns the lowercase wire name, matching the persisted format.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

/// Administrative order priority, set manually or by bulk operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}
