//! Outbound ports.
//!
//! Application handlers depend on these traits; adapters implement
//! them against Postgres, the payment gateway's HTTP API, and in
//! tests, in-memory fakes.

pub mod automation_repository;
pub mod cart;
pub mod catalog;
pub mod job_queue;
pub mod notifier;
pub mod order_repository;
pub mod payment_gateway;
pub mod payment_repository;
pub mod refund_repository;

pub use automation_repository::AutomationRepository;
pub use cart::{CartItem, CartSnapshot, CartStore};
pub use catalog::{Catalog, DigitalDelivery, PlanRecord, ProductRecord};
pub use job_queue::{Job, JobPayload, JobQueue};
pub use notifier::{NotificationKind, Notifier};
pub use order_repository::OrderRepository;
pub use payment_gateway::{
    GatewayError, GatewayRefund, GatewaySession, InitiateRequest, PaymentGateway, Verification,
};
pub use payment_repository::{CompletionClaim, FailureClaim, PaymentRepository};
pub use refund_repository::{CancellationRepository, RefundRepository};
