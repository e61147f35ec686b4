//! Automation rules.
//!
//! A rule matches a trigger event against an exact-match condition map
//! and runs an ordered action list. Dispatch is a closed enum per
//! event and action type; adding a variant forces every match site to
//! handle it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OrderId, RuleId, Timestamp};

use super::AutomationAction;

/// Events automation rules can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    OrderCreated,
    PaymentReceived,
    StatusChanged,
    TimeBased,
}

/// A concrete occurrence of a trigger, with the attributes rules can
/// condition on.
#[derive(Debug, Clone)]
pub struct TriggerContext {
    pub event: TriggerEvent,
    pub order_id: OrderId,
    /// Exact-match attributes, e.g. `status => "shipped"`,
    /// `priority => "urgent"`.
    pub attributes: HashMap<String, String>,
}

impl TriggerContext {
    pub fn new(event: TriggerEvent, order_id: OrderId) -> Self {
        Self {
            event,
            order_id,
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// One action slot in a rule, optionally delayed.
///
/// Delayed actions are handed to the durable job queue, never slept on
/// in-process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub action: AutomationAction,
    pub delay_secs: Option<u64>,
}

/// Declarative trigger/action rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: RuleId,
    pub name: String,
    pub enabled: bool,
    pub trigger: TriggerEvent,

    /// Every entry must match the trigger context exactly for the rule
    /// to fire. An empty map matches every occurrence of the trigger.
    pub conditions: HashMap<String, String>,

    /// Executed strictly in order.
    pub actions: Vec<ScheduledAction>,

    pub execution_count: u64,
    pub last_run_at: Option<Timestamp>,
}

impl AutomationRule {
    pub fn new(
        id: RuleId,
        name: impl Into<String>,
        trigger: TriggerEvent,
        conditions: HashMap<String, String>,
        actions: Vec<ScheduledAction>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            enabled: true,
            trigger,
            conditions,
            actions,
            execution_count: 0,
            last_run_at: None,
        }
    }

    /// Whether this rule fires for the given context.
    pub fn matches(&self, ctx: &TriggerContext) -> bool {
        if !self.enabled || self.trigger != ctx.event {
            return false;
        }
        self.conditions
            .iter()
            .all(|(key, expected)| ctx.attributes.get(key) == Some(expected))
    }

    /// Records one execution.
    pub fn record_run(&mut self, now: Timestamp) {
        self.execution_count += 1;
        self.last_run_at = Some(now);
    }
}
