//! Download link entitlements for digital products.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProductId, Timestamp};

/// Default per-link download cap when the product does not configure one.
pub const DEFAULT_MAX_DOWNLOADS: u32 = 5;

/// How long an issued link stays valid.
pub const LINK_VALIDITY_DAYS: i64 = 30;

/// Why a download attempt was denied.
///
/// Each reason is surfaced separately so the storefront can tell the
/// customer exactly what to do (pay, buy again, or contact support).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadDenied {
    /// The order's payment is not completed.
    NotPaid,
    /// `download_count` has reached `max_downloads`.
    LimitExceeded,
    /// The link's expiry date has passed.
    Expired,
}

/// A granted right to download one digital product, bounded by a
/// usage cap and an expiry date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub product_id: ProductId,
    pub url: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub download_count: u32,
    pub max_downloads: u32,
}

impl DownloadLink {
    /// Issues a fresh link with the default validity window.
    pub fn issue(
        product_id: ProductId,
        url: impl Into<String>,
        now: Timestamp,
        max_downloads: Option<u32>,
    ) -> Self {
        Self {
            product_id,
            url: url.into(),
            issued_at: now,
            expires_at: now.add_days(LINK_VALIDITY_DAYS),
            download_count: 0,
            max_downloads: max_downloads.unwrap_or(DEFAULT_MAX_DOWNLOADS),
        }
    }

    /// Checks limit and expiry (payment is checked by the caller,
    /// before the link is even consulted).
    pub fn check(&self, now: Timestamp) -> Result<(), DownloadDenied> {
        if self.download_count >= self.max_downloads {
            return Err(DownloadDenied::LimitExceeded);
        }
        if now.is_after(&self.expires_at) {
            return Err(DownloadDenied::Expired);
        }
        Ok(())
    }

    /// Registers one download, enforcing the cap.
    ///
    /// Returns the URL to serve. The `download_count <= max_downloads`
    /// invariant holds because the increment only happens after the
    /// check passes.
    pub fn register_download(&mut self, now: Timestamp) -> Result<&str, DownloadDenied> {
        self.check(now)?;
        self.download_count += 1;
        Ok(&self.url)
    }

    /// Remaining downloads before the cap is reached.
    pub fn remaining(&self) -> u32 {
        self.max_downloads.saturating_sub(self.download_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(max: u32) -> DownloadLink {
        DownloadLink::issue(
            ProductId::new(),
            "https://files.example.com/abc",
            Timestamp::now(),
            Some(max),
        )
    }

    #[test]
    fn issue_defaults_to_five_downloads() {
        let link = DownloadLink::issue(ProductId::new(), "u", Timestamp::now(), None);
        assert_eq!(link.max_downloads, DEFAULT_MAX_DOWNLOADS);
        assert_eq!(link.download_count, 0);
    }

    #[test]
    fn register_download_increments_until_cap() {
        let mut link = link(2);
        assert!(link.register_download(Timestamp::now()).is_ok());
        assert!(link.register_download(Timestamp::now()).is_ok());
        assert_eq!(
            link.register_download(Timestamp::now()),
            Err(DownloadDenied::LimitExceeded)
        );
        // Count never exceeds the cap.
        assert_eq!(link.download_count, link.max_downloads);
    }

    #[test]
    fn at_cap_request_is_rejected() {
        let mut link = link(1);
        link.register_download(Timestamp::now()).unwrap();
        assert_eq!(link.check(Timestamp::now()), Err(DownloadDenied::LimitExceeded));
    }

    #[test]
    fn expired_link_is_rejected() {
        let mut link = link(5);
        let after_expiry = link.expires_at.add_days(1);
        assert_eq!(
            link.register_download(after_expiry),
            Err(DownloadDenied::Expired)
        );
        assert_eq!(link.download_count, 0);
    }

    #[test]
    fn limit_is_reported_before_expiry() {
        // A link that is both exhausted and expired reports the limit
        // first, matching the documented check order.
        let mut link = link(1);
        link.register_download(Timestamp::now()).unwrap();
        let after_expiry = link.expires_at.add_days(1);
        assert_eq!(link.check(after_expiry), Err(DownloadDenied::LimitExceeded));
    }
}
