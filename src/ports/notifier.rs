//! Notification port.
//!
//! Notifications are best effort: handlers fire them after the state
//! change commits and never fail the operation on notifier errors.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

/// What happened, from the customer's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    PaymentReceived,
    PaymentFailed,
    OrderStatusChanged,
    DownloadReady,
    RefundRequested,
    RefundApproved,
    RefundRejected,
    RefundCompleted,
    CancellationApproved,
    CancellationRejected,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentReceived => "payment_received",
            Self::PaymentFailed => "payment_failed",
            Self::OrderStatusChanged => "order_status_changed",
            Self::DownloadReady => "download_ready",
            Self::RefundRequested => "refund_requested",
            Self::RefundApproved => "refund_approved",
            Self::RefundRejected => "refund_rejected",
            Self::RefundCompleted => "refund_completed",
            Self::CancellationApproved => "cancellation_approved",
            Self::CancellationRejected => "cancellation_rejected",
        }
    }
}

/// Port to email/push/whatever delivers customer notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        user_id: &UserId,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> Result<(), DomainError>;
}
