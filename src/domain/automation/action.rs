//! Automation actions.

use serde::{Deserialize, Serialize};

use crate::domain::order::{OrderPriority, OrderStatus};

/// What an automation rule does when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutomationAction {
    /// Move the target order to a new status.
    UpdateStatus {
        status: OrderStatus,
        note: Option<String>,
    },

    /// Send a notification to the order's customer.
    SendNotification { event_type: String },

    /// Attach a tracking reference to the order.
    AssignTracking { carrier: String },

    /// Set the order's administrative priority.
    SetPriority { priority: OrderPriority },
}

impl AutomationAction {
    /// Short name used in logs and run records.
    pub fn kind(&self) -> &'static str {
        match self {
            AutomationAction::UpdateStatus { .. } => "update_status",
            AutomationAction::SendNotification { .. } => "send_notification",
            AutomationAction::AssignTracking { .. } => "assign_tracking",
            AutomationAction::SetPriority { .. } => "set_priority",
        }
    }
}
