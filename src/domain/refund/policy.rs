//! Refund policies.
//!
//! Eligibility rules per product class. Deployments can supply their
//! own table; the defaults below match the storefront's standard
//! terms.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Money;

/// Coarse product classification used for refund policy lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductClass {
    Digital,
    Physical,
    Subscription,
}

/// Refund rules for one product class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPolicy {
    pub product_class: ProductClass,

    /// Days after order creation during which refunds may be requested.
    pub refund_window_days: i64,

    /// Whether partial (per-line) refunds are allowed at all.
    pub allow_partial_refunds: bool,

    /// Requests at or under this amount are created pre-approved.
    pub auto_approve_threshold: Money,

    /// Whether requests above the threshold need an explicit decision.
    pub requires_approval: bool,
}

/// Default policy table.
pub static DEFAULT_POLICIES: Lazy<Vec<RefundPolicy>> = Lazy::new(|| {
    vec![
        RefundPolicy {
            product_class: ProductClass::Digital,
            refund_window_days: 14,
            allow_partial_refunds: true,
            auto_approve_threshold: Money::from_cents(2_000),
            requires_approval: true,
        },
        RefundPolicy {
            product_class: ProductClass::Physical,
            refund_window_days: 30,
            allow_partial_refunds: true,
            auto_approve_threshold: Money::from_cents(1_000),
            requires_approval: true,
        },
        RefundPolicy {
            product_class: ProductClass::Subscription,
            refund_window_days: 7,
            allow_partial_refunds: false,
            auto_approve_threshold: Money::ZERO,
            requires_approval: true,
        },
    ]
});

/// A deployment's full policy table with per-order resolution.
#[derive(Debug, Clone)]
pub struct RefundPolicySet {
    policies: Vec<RefundPolicy>,
}

impl RefundPolicySet {
    pub fn new(policies: Vec<RefundPolicy>) -> Self {
        Self { policies }
    }

    /// The standard policy table.
    pub fn standard() -> Self {
        Self::new(DEFAULT_POLICIES.clone())
    }

    /// Policy for a single product class, if configured.
    pub fn for_class(&self, class: ProductClass) -> Option<&RefundPolicy> {
        self.policies.iter().find(|p| p.product_class == class)
    }

    /// Resolves the effective policy for an order spanning the given
    /// classes: the most restrictive rule on every axis.
    ///
    /// Returns `None` when any involved class has no configured policy
    /// (no policy means no refunds for that class).
    pub fn effective(&self, classes: &[ProductClass]) -> Option<EffectivePolicy> {
        if classes.is_empty() {
            return None;
        }
        let mut window = i64::MAX;
        let mut allow_partial = true;
        let mut threshold = Money::from_cents(i64::MAX);
        let mut requires_approval = false;

        for class in classes {
            let policy = self.for_class(*class)?;
            window = window.min(policy.refund_window_days);
            allow_partial = allow_partial && policy.allow_partial_refunds;
            threshold = threshold.min(policy.auto_approve_threshold);
            requires_approval = requires_approval || policy.requires_approval;
        }

        Some(EffectivePolicy {
            refund_window_days: window,
            allow_partial_refunds: allow_partial,
            auto_approve_threshold: threshold,
            requires_approval,
        })
    }
}

/// Most-restrictive combination of the policies covering an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePolicy {
    pub refund_window_days: i64,
    pub allow_partial_refunds: bool,
    pub auto_approve_threshold: Money,
    pub requires_approval: bool,
}
