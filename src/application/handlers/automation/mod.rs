//! Automation rule engine.

mod engine;

pub use engine::AutomationEngine;
