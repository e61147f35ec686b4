//! Digital entitlements.
//!
//! What a completed payment grants: download links, license keys, and
//! subscription access windows. All three are value objects embedded
//! on the order.

mod download_link;
mod license_key;
mod subscription_access;

pub use download_link::{
    DownloadDenied, DownloadLink, DEFAULT_MAX_DOWNLOADS, LINK_VALIDITY_DAYS,
};
pub use license_key::{LicenseKey, LicensePolicy, KEY_VALIDITY_YEARS};
pub use subscription_access::{BillingCycle, SubscriptionAccess, LIFETIME_YEARS};
