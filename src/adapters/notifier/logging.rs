//! Log-only notifier.
//!
//! Stands in for the real email/push delivery channel: every
//! notification becomes a structured log line. Handlers already treat
//! notification failures as best effort, so this adapter is also the
//! safe default wherever no channel is configured.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{NotificationKind, Notifier};

pub struct LoggingNotifier;

impl LoggingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(
        &self,
        user_id: &UserId,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> Result<(), DomainError> {
        tracing::info!(
            user_id = %user_id,
            kind = kind.as_str(),
            payload = %payload,
            "notification"
        );
        Ok(())
    }
}
