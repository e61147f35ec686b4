//! Order aggregate entity.
//!
//! The Order is a durable snapshot of what a customer bought, at which
//! prices, and where it stands in the fulfillment lifecycle. It is
//! mutated by the fulfillment, refund, cancellation, and bulk engines.
//!
//! # Design Decisions
//!
//! - **Money in cents**: all monetary values are i64 cents
//! - **Append-only history**: every status change appends a
//!   `StatusHistoryEntry`; entries are never rewritten
//! - **Paired payment status**: `status` and `payment_status` are only
//!   changed together through aggregate methods, never field by field
//! - **Idempotent entitlements**: issuing an entitlement that already
//!   exists for the same product/plan keeps what the customer holds;
//!   consumed download counts, license keys, and access windows
//!   survive a replayed fulfillment

use serde::{Deserialize, Serialize};

use crate::domain::entitlement::{DownloadLink, LicenseKey, SubscriptionAccess};
use crate::domain::foundation::{
    DomainError, ErrorCode, Money, OrderId, PlanId, ProductId, StateMachine, Timestamp, UserId,
};
use crate::domain::payment::PaymentStatus;

use super::{LineItem, OrderPriority, OrderStatus, PricingSnapshot};

/// One entry in the append-only order status history.
///
/// The field set is a stable persisted format; renaming fields breaks
/// stored orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub timestamp: Timestamp,
    pub note: Option<String>,
    pub actor: String,
}

/// Shipping tracking reference assigned during fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub carrier: String,
    pub reference: String,
}

/// Order aggregate.
///
/// # Invariants
///
/// - `status_history` is append-only and never empty after creation
/// - `payment_status` only changes together with a corresponding
///   payment-side transition
/// - entitlements exist only while `payment_status.is_paid()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier for this order.
    pub id: OrderId,

    /// Customer who placed the order.
    pub user_id: UserId,

    /// Immutable purchase snapshot.
    pub items: Vec<LineItem>,

    /// Frozen pricing breakdown.
    pub pricing: PricingSnapshot,

    /// Fulfillment lifecycle status.
    pub status: OrderStatus,

    /// Mirror of the payment record's status, updated in lockstep.
    pub payment_status: PaymentStatus,

    /// Append-only status trail.
    pub status_history: Vec<StatusHistoryEntry>,

    /// Issued download entitlements, one per digital product.
    pub download_links: Vec<DownloadLink>,

    /// Issued license keys, one per licensed product.
    pub license_keys: Vec<LicenseKey>,

    /// Granted subscription access windows, one per plan.
    pub subscriptions: Vec<SubscriptionAccess>,

    /// Administrative priority.
    pub priority: OrderPriority,

    /// Carrier tracking reference, once assigned.
    pub tracking: Option<TrackingInfo>,

    /// When the order was created (refund windows count from here).
    pub created_at: Timestamp,

    /// When the order was last updated.
    pub updated_at: Timestamp,
}

impl Order {
    /// Creates a pending order from a checkout snapshot.
    pub fn create(
        id: OrderId,
        user_id: UserId,
        items: Vec<LineItem>,
        pricing: PricingSnapshot,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::validation("items", "Order must contain at least one item"));
        }
        Ok(Self {
            id,
            user_id,
            items,
            pricing,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            status_history: vec![StatusHistoryEntry {
                status: OrderStatus::Pending,
                timestamp: now,
                note: Some("order created".to_string()),
                actor: "system".to_string(),
            }],
            download_links: Vec::new(),
            license_keys: Vec::new(),
            subscriptions: Vec::new(),
            priority: OrderPriority::Normal,
            tracking: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Total amount charged for this order.
    pub fn total_amount(&self) -> Money {
        self.pricing.total
    }

    /// True when every line is a digital deliverable (product or plan);
    /// such orders complete without shipping.
    pub fn is_all_digital(&self, is_digital_product: impl Fn(ProductId) -> bool) -> bool {
        self.items.iter().all(|item| match item.item.product_id() {
            Some(product_id) => is_digital_product(product_id),
            None => true, // subscriptions ship nothing
        })
    }

    /// Marks the order paid, moving status and payment status together.
    ///
    /// All-digital orders complete immediately; others start processing.
    /// Idempotent: a second call on an already-paid order is a no-op.
    pub fn mark_paid(&mut self, all_digital: bool, now: Timestamp) -> Result<(), DomainError> {
        if self.payment_status.is_paid() {
            return Ok(());
        }
        let target = if all_digital {
            OrderStatus::Completed
        } else {
            OrderStatus::Processing
        };
        self.transition(target, Some("payment completed".to_string()), "system", now)?;
        self.payment_status = PaymentStatus::Completed;
        Ok(())
    }

    /// Moves the order to a new fulfillment status, appending history.
    pub fn transition(
        &mut self,
        target: OrderStatus,
        note: Option<String>,
        actor: &str,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot transition order from {:?} to {:?}", self.status, target),
            )
        })?;
        self.status_history.push(StatusHistoryEntry {
            status: target,
            timestamp: now,
            note,
            actor: actor.to_string(),
        });
        self.updated_at = now;
        Ok(())
    }

    /// Cancels the order from any non-terminal state.
    pub fn cancel(&mut self, note: Option<String>, actor: &str, now: Timestamp) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::new(
                ErrorCode::AlreadyTerminal,
                format!("Order is already {:?}", self.status),
            ));
        }
        self.transition(OrderStatus::Cancelled, note, actor, now)
    }

    /// Applies the order-side outcome of a completed refund.
    ///
    /// Full refunds move order and payment status to refunded together.
    /// When the fulfillment status cannot legally reach `Refunded`
    /// (a cancelled order, or one still mid-fulfillment), only the
    /// payment side moves. Partial refunds only mark the payment side.
    pub fn apply_refund(&mut self, full: bool, now: Timestamp) -> Result<(), DomainError> {
        if full {
            if self.status != OrderStatus::Refunded
                && self.status.can_transition_to(&OrderStatus::Refunded)
            {
                self.transition(
                    OrderStatus::Refunded,
                    Some("refund completed".to_string()),
                    "system",
                    now,
                )?;
            }
            self.payment_status = PaymentStatus::Refunded;
            self.updated_at = now;
        } else {
            self.payment_status = PaymentStatus::PartiallyRefunded;
            self.updated_at = now;
        }
        Ok(())
    }

    /// Sets the administrative priority.
    pub fn set_priority(&mut self, priority: OrderPriority, now: Timestamp) {
        self.priority = priority;
        self.updated_at = now;
    }

    /// Assigns a carrier tracking reference, replacing any previous one.
    pub fn assign_tracking(
        &mut self,
        carrier: impl Into<String>,
        reference: impl Into<String>,
        now: Timestamp,
    ) {
        self.tracking = Some(TrackingInfo {
            carrier: carrier.into(),
            reference: reference.into(),
        });
        self.updated_at = now;
    }

    /// Finds the download link for a product, if issued.
    pub fn download_link(&self, product_id: ProductId) -> Option<&DownloadLink> {
        self.download_links.iter().find(|l| l.product_id == product_id)
    }

    /// Mutable access to a product's download link.
    pub fn download_link_mut(&mut self, product_id: ProductId) -> Option<&mut DownloadLink> {
        self.download_links.iter_mut().find(|l| l.product_id == product_id)
    }

    /// Installs a download link for a product. Re-issuance refreshes
    /// the url and cap but keeps the original issue date and the
    /// consumed download count; duplicates are never created.
    pub fn upsert_download_link(&mut self, link: DownloadLink, now: Timestamp) {
        match self.download_link_mut(link.product_id) {
            Some(existing) => {
                existing.url = link.url;
                existing.max_downloads = link.max_downloads;
            }
            None => self.download_links.push(link),
        }
        self.updated_at = now;
    }

    /// Installs a license key for a product. An existing key is kept
    /// unchanged: the key the customer already holds is never rotated.
    pub fn upsert_license_key(&mut self, key: LicenseKey, now: Timestamp) {
        if !self.license_keys.iter().any(|k| k.product_id == key.product_id) {
            self.license_keys.push(key);
            self.updated_at = now;
        }
    }

    /// Records a subscription grant. An existing grant for the plan is
    /// kept, so a replayed fulfillment never moves the access window.
    pub fn upsert_subscription(&mut self, grant: SubscriptionAccess, now: Timestamp) {
        if !self.subscriptions.iter().any(|s| s.plan_id == grant.plan_id) {
            self.subscriptions.push(grant);
            self.updated_at = now;
        }
    }

    /// Mutable access to a plan's subscription grant.
    pub fn subscription_mut(&mut self, plan_id: PlanId) -> Option<&mut SubscriptionAccess> {
        self.subscriptions.iter_mut().find(|s| s.plan_id == plan_id)
    }

    /// Age of the order in whole days.
    pub fn age_in_days(&self, now: Timestamp) -> i64 {
        now.duration_since(&self.created_at).num_days()
    }
}
