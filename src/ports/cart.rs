//! Cart store port.
//!
//! Checkout reads the user's cart once, snapshots prices into the
//! order, and clears the cart only after the payment session is
//! created. The clear is idempotent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, Money, UserId};
use crate::domain::order::ItemRef;

/// One line of a cart as priced at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub item: ItemRef,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub original_price: Money,
}

/// A cart at the moment checkout read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub coupon_code: Option<String>,
    pub coupon_discount: Money,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Port to wherever carts live.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the user's current cart, or `None` when they have none.
    async fn snapshot(&self, user_id: &UserId) -> Result<Option<CartSnapshot>, DomainError>;

    /// Empties the user's cart. Clearing an absent cart succeeds.
    async fn clear(&self, user_id: &UserId) -> Result<(), DomainError>;
}
