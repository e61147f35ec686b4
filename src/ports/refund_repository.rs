//! Refund request and cancellation repository ports.

use async_trait::async_trait;

use crate::domain::foundation::{CancellationId, DomainError, OrderId, RefundRequestId};
use crate::domain::refund::{Cancellation, RefundRequest};

/// Repository port for RefundRequest persistence.
#[async_trait]
pub trait RefundRepository: Send + Sync {
    async fn create(&self, request: &RefundRequest) -> Result<(), DomainError>;

    async fn update(&self, request: &RefundRequest) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &RefundRequestId) -> Result<Option<RefundRequest>, DomainError>;

    /// All refund requests against an order, oldest first.
    async fn find_by_order(&self, order_id: &OrderId) -> Result<Vec<RefundRequest>, DomainError>;
}

/// Repository port for Cancellation persistence.
#[async_trait]
pub trait CancellationRepository: Send + Sync {
    async fn create(&self, cancellation: &Cancellation) -> Result<(), DomainError>;

    async fn update(&self, cancellation: &Cancellation) -> Result<(), DomainError>;

    async fn find_by_id(
        &self,
        id: &CancellationId,
    ) -> Result<Option<Cancellation>, DomainError>;
}
