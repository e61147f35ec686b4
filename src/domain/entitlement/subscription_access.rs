//! Subscription access windows.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PlanId, Timestamp};

/// Sentinel horizon for lifetime plans.
pub const LIFETIME_YEARS: u32 = 100;

/// Recurring billing duration of a subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Yearly,
    Lifetime,
}

impl BillingCycle {
    /// Computes the access window end for a period starting at `start`.
    ///
    /// Calendar arithmetic, not day counting: a monthly plan bought on
    /// Jan 15 ends on Feb 15.
    pub fn period_end(&self, start: Timestamp) -> Timestamp {
        match self {
            BillingCycle::Monthly => start.add_calendar_months(1),
            BillingCycle::Quarterly => start.add_calendar_months(3),
            BillingCycle::Yearly => start.add_years(1),
            BillingCycle::Lifetime => start.add_years(LIFETIME_YEARS),
        }
    }
}

/// A customer's granted access window to a subscription plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionAccess {
    pub plan_id: PlanId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub auto_renew: bool,
    pub active: bool,
}

impl SubscriptionAccess {
    /// Grants access for one billing period starting now.
    pub fn grant(plan_id: PlanId, cycle: BillingCycle, now: Timestamp) -> Self {
        Self {
            plan_id,
            starts_at: now,
            ends_at: cycle.period_end(now),
            // Lifetime plans never renew.
            auto_renew: cycle != BillingCycle::Lifetime,
            active: true,
        }
    }

    /// Whether the grant covers the given moment.
    pub fn covers(&self, now: Timestamp) -> bool {
        self.active && !now.is_after(&self.ends_at) && !now.is_before(&self.starts_at)
    }

    /// Immediate cancellation: access ends now and the grant deactivates.
    pub fn end_now(&mut self, now: Timestamp) {
        self.ends_at = now;
        self.auto_renew = false;
        self.active = false;
    }

    /// End-of-period cancellation: keep access, stop renewing.
    pub fn disable_auto_renew(&mut self) {
        self.auto_renew = false;
    }

    /// Scheduled cancellation: access runs until the given date, no renewal.
    pub fn schedule_end(&mut self, end_date: Timestamp) {
        self.ends_at = end_date;
        self.auto_renew = false;
    }
}
