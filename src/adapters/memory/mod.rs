//! In-memory adapter implementations.
//!
//! Deterministic, lock-based stores used by unit and integration
//! tests. They enforce the same uniqueness and compare-and-set
//! contracts as the Postgres adapters, so handler tests exercise the
//! real race semantics.
//!
//! Test-only quality: lock poisoning panics instead of surfacing as an
//! error. Production deployments use the `postgres` adapters.

mod automation_repository;
mod cart_store;
mod catalog;
mod job_queue;
mod order_repository;
mod payment_repository;
mod refund_repository;

pub use automation_repository::InMemoryAutomationRepository;
pub use cart_store::InMemoryCartStore;
pub use catalog::InMemoryCatalog;
pub use job_queue::InMemoryJobQueue;
pub use order_repository::InMemoryOrderRepository;
pub use payment_repository::InMemoryPaymentRepository;
pub use refund_repository::{InMemoryCancellationRepository, InMemoryRefundRepository};
