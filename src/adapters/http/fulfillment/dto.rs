//! HTTP DTOs for fulfillment endpoints.

use serde::Serialize;

use crate::application::handlers::DownloadItemResult;

/// A granted download.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadResponse {
    pub url: String,
    pub remaining_downloads: u32,
    /// Link expiry (ISO 8601).
    pub expires_at: String,
}

impl From<DownloadItemResult> for DownloadResponse {
    fn from(result: DownloadItemResult) -> Self {
        Self {
            url: result.url,
            remaining_downloads: result.remaining_downloads,
            expires_at: result.expires_at.as_datetime().to_rfc3339(),
        }
    }
}
