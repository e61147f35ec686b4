//! Order repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrderId, UserId};
use crate::domain::order::Order;

/// Repository port for Order aggregate persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists a new order.
    async fn save(&self, order: &Order) -> Result<(), DomainError>;

    /// Updates an existing order.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order does not exist
    async fn update(&self, order: &Order) -> Result<(), DomainError>;

    /// Finds an order by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError>;

    /// Loads a batch of orders by id.
    ///
    /// Returns whatever subset exists; callers that need all-or-nothing
    /// semantics compare the result against the requested id set.
    async fn find_many(&self, ids: &[OrderId]) -> Result<Vec<Order>, DomainError>;

    /// Lists a customer's orders, newest first.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, DomainError>;

    /// Writes a batch of orders atomically: either every order is
    /// updated or none is. Bulk operations rely on this for their
    /// all-or-nothing guarantee.
    async fn update_all(&self, orders: &[Order]) -> Result<(), DomainError>;
}
