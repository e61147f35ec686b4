//! Order line items.
//!
//! A line item references exactly one of a catalog product or a
//! subscription plan. The tagged `ItemRef` enum makes a "both set" or
//! "neither set" line unrepresentable.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, PlanId, ProductId, ValidationError};

/// Reference to the catalog entry a line item was priced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemRef {
    Product { product_id: ProductId },
    Subscription { plan_id: PlanId },
}

impl ItemRef {
    pub fn product(product_id: ProductId) -> Self {
        ItemRef::Product { product_id }
    }

    pub fn subscription(plan_id: PlanId) -> Self {
        ItemRef::Subscription { plan_id }
    }

    /// Product id if this references a product.
    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            ItemRef::Product { product_id } => Some(*product_id),
            ItemRef::Subscription { .. } => None,
        }
    }

    /// Plan id if this references a subscription plan.
    pub fn plan_id(&self) -> Option<PlanId> {
        match self {
            ItemRef::Subscription { plan_id } => Some(*plan_id),
            ItemRef::Product { .. } => None,
        }
    }
}

/// Snapshot of a purchased item at checkout time.
///
/// Prices are frozen here; later catalog price changes never affect an
/// existing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// What was purchased.
    pub item: ItemRef,

    /// Display name at purchase time.
    pub name: String,

    /// Units purchased. Always 1 for subscriptions.
    pub quantity: u32,

    /// Price per unit actually charged.
    pub unit_price: Money,

    /// Undiscounted per-unit price at purchase time.
    pub original_price: Money,
}

impl LineItem {
    /// Creates a line item, rejecting a zero quantity.
    pub fn new(
        item: ItemRef,
        name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
        original_price: Money,
    ) -> Result<Self, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::out_of_range("quantity", 1, u32::MAX as i64, 0));
        }
        Ok(Self {
            item,
            name: name.into(),
            quantity,
            unit_price,
            original_price,
        })
    }

    /// Line total (unit price times quantity).
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}
