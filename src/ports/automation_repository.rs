//! Automation rule storage port.

use async_trait::async_trait;

use crate::domain::automation::{AutomationRule, TriggerEvent};
use crate::domain::foundation::{DomainError, RuleId, Timestamp};

#[async_trait]
pub trait AutomationRepository: Send + Sync {
    async fn save(&self, rule: &AutomationRule) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &RuleId) -> Result<Option<AutomationRule>, DomainError>;

    /// Enabled rules registered for the given trigger event.
    async fn list_enabled_for(
        &self,
        trigger: TriggerEvent,
    ) -> Result<Vec<AutomationRule>, DomainError>;

    /// Bumps the rule's execution count and last-run timestamp.
    async fn record_run(&self, id: &RuleId, at: Timestamp) -> Result<(), DomainError>;
}
