//! Shared domain building blocks.
//!
//! Value objects and traits used across every aggregate: typed ids,
//! money in cents, UTC timestamps, the state machine trait, and the
//! domain error taxonomy.

mod errors;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    BulkOperationId, CancellationId, OrderId, PaymentId, PlanId, ProductId, RefundRequestId,
    RuleId, UserId,
};
pub use money::Money;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
