//! Order pricing snapshot.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Money;

use super::LineItem;

/// Frozen pricing breakdown for an order.
///
/// `total = subtotal + tax + shipping − coupon_discount`, floored at
/// zero. The snapshot is computed once at checkout and never
/// recalculated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub coupon_code: Option<String>,
    pub coupon_discount: Money,
    pub total: Money,
}

impl PricingSnapshot {
    /// Computes the snapshot from line items and checkout charges.
    pub fn compute(
        items: &[LineItem],
        tax: Money,
        shipping: Money,
        coupon_code: Option<String>,
        coupon_discount: Money,
    ) -> Self {
        let subtotal: Money = items.iter().map(LineItem::line_total).sum();
        let total = (subtotal + tax + shipping).saturating_sub(coupon_discount);
        Self {
            subtotal,
            tax,
            shipping,
            coupon_code,
            coupon_discount,
            total,
        }
    }
}
