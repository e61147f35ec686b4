//! Refunds and cancellations.

mod cancellation;
mod policy;
mod request;

pub use cancellation::{
    Cancellation, CancellationMode, CancellationScope, CancellationStatus,
};
pub use policy::{
    EffectivePolicy, ProductClass, RefundPolicy, RefundPolicySet, DEFAULT_POLICIES,
};
pub use request::{RefundLine, RefundRequest, RefundStatus, RefundType};
