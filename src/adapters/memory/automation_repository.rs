//! In-memory automation rule store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::automation::{AutomationRule, TriggerEvent};
use crate::domain::foundation::{DomainError, ErrorCode, RuleId, Timestamp};
use crate::ports::AutomationRepository;

pub struct InMemoryAutomationRepository {
    rules: Mutex<HashMap<RuleId, AutomationRule>>,
}

impl InMemoryAutomationRepository {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryAutomationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AutomationRepository for InMemoryAutomationRepository {
    async fn save(&self, rule: &AutomationRule) -> Result<(), DomainError> {
        self.rules
            .lock()
            .expect("rules lock poisoned")
            .insert(rule.id, rule.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &RuleId) -> Result<Option<AutomationRule>, DomainError> {
        Ok(self.rules.lock().expect("rules lock poisoned").get(id).cloned())
    }

    async fn list_enabled_for(
        &self,
        trigger: TriggerEvent,
    ) -> Result<Vec<AutomationRule>, DomainError> {
        let rules = self.rules.lock().expect("rules lock poisoned");
        let mut result: Vec<AutomationRule> = rules
            .values()
            .filter(|r| r.enabled && r.trigger == trigger)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn record_run(&self, id: &RuleId, at: Timestamp) -> Result<(), DomainError> {
        let mut rules = self.rules.lock().expect("rules lock poisoned");
        let rule = rules.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::RuleNotFound, format!("Rule {} not found", id))
        })?;
        rule.record_run(at);
        Ok(())
    }
}
