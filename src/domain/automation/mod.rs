//! Declarative automation rules.

mod action;
mod rule;

pub use action::AutomationAction;
pub use rule::{AutomationRule, ScheduledAction, TriggerContext, TriggerEvent};
