//! Catalog collaborator port.
//!
//! Read access to products and subscription plans, plus the one write
//! the fulfillment engine performs: incrementing aggregate sales
//! counters. Counter writes are increments keyed by transaction id so
//! at-least-once fulfillment never double-counts; they are never
//! recomputed from order history.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entitlement::{BillingCycle, LicensePolicy};
use crate::domain::foundation::{DomainError, Money, PlanId, ProductId};
use crate::domain::payment::TransactionId;
use crate::domain::refund::ProductClass;

/// Digital delivery configuration on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalDelivery {
    /// Where the deliverable lives; becomes the download link URL.
    pub file_url: String,

    /// Licensing model, when the product issues keys.
    pub license: Option<LicensePolicy>,

    /// Per-purchase download cap; `None` uses the engine default.
    pub max_downloads: Option<u32>,
}

/// Catalog view of a product, as fulfillment needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub active: bool,
    pub price: Money,

    /// Remaining stock for stocked physical products; `None` for
    /// digital or made-to-order items.
    pub stock: Option<u32>,

    /// Set for digital products; `None` means physical delivery.
    pub digital: Option<DigitalDelivery>,
}

impl ProductRecord {
    /// Product class for refund policy resolution.
    pub fn class(&self) -> ProductClass {
        if self.digital.is_some() {
            ProductClass::Digital
        } else {
            ProductClass::Physical
        }
    }
}

/// Catalog view of a subscription plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub id: PlanId,
    pub name: String,
    pub active: bool,
    pub price: Money,
    pub billing_cycle: BillingCycle,
}

/// Port to the product/plan catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_product(&self, id: &ProductId) -> Result<Option<ProductRecord>, DomainError>;

    async fn find_plan(&self, id: &PlanId) -> Result<Option<PlanRecord>, DomainError>;

    /// Increments a product's sales count and revenue.
    ///
    /// Deduplicated by `(product, transaction)`: replaying the same
    /// transaction id is a no-op.
    async fn record_sale(
        &self,
        product_id: &ProductId,
        transaction_id: &TransactionId,
        quantity: u32,
        revenue: Money,
    ) -> Result<(), DomainError>;

    /// Increments a plan's subscriber count and revenue, deduplicated
    /// by `(plan, transaction)`.
    async fn record_subscription_sale(
        &self,
        plan_id: &PlanId,
        transaction_id: &TransactionId,
        revenue: Money,
    ) -> Result<(), DomainError>;
}
