//! Domain layer: aggregates, value objects, and pure business rules.

pub mod automation;
pub mod entitlement;
pub mod foundation;
pub mod order;
pub mod payment;
pub mod refund;
