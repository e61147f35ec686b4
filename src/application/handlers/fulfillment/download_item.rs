//! DownloadItemHandler - Command handler for digital download requests.
//!
//! Enforces the entitlement boundary in a fixed check order: paid,
//! then under the download cap, then unexpired. A passing request
//! increments the counter and returns the URL.
//!
//! Lazy backfill: a paid digital line with no link (a fulfillment that
//! predates link issuance, or a partially-applied projection) gets one
//! issued with the default window before the checks run.

use std::sync::Arc;

use crate::domain::entitlement::{DownloadDenied, DownloadLink};
use crate::domain::foundation::{DomainError, ErrorCode, OrderId, ProductId, Timestamp};
use crate::ports::{Catalog, OrderRepository};

/// Command to consume one download of a purchased digital product.
#[derive(Debug, Clone)]
pub struct DownloadItemCommand {
    pub order_id: OrderId,
    pub product_id: ProductId,
}

/// Granted download.
#[derive(Debug, Clone)]
pub struct DownloadItemResult {
    pub url: String,
    pub remaining_downloads: u32,
    pub expires_at: Timestamp,
}

pub struct DownloadItemHandler {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn Catalog>,
}

impl DownloadItemHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, catalog: Arc<dyn Catalog>) -> Self {
        Self { orders, catalog }
    }

    pub async fn handle(
        &self,
        cmd: DownloadItemCommand,
    ) -> Result<DownloadItemResult, DomainError> {
        let mut order = self
            .orders
            .find_by_id(&cmd.order_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::OrderNotFound,
                    format!("Order {} not found", cmd.order_id),
                )
            })?;
        let now = Timestamp::now();

        if !order.payment_status.is_paid() {
            return Err(denied_to_domain(DownloadDenied::NotPaid));
        }

        let holds_product = order
            .items
            .iter()
            .any(|line| line.item.product_id() == Some(cmd.product_id));
        if !holds_product {
            return Err(DomainError::new(
                ErrorCode::ProductNotFound,
                format!("Order {} has no line for product {}", cmd.order_id, cmd.product_id),
            ));
        }

        if order.download_link(cmd.product_id).is_none() {
            self.backfill_link(&mut order, cmd.product_id, now).await?;
        }

        let link = order
            .download_link_mut(cmd.product_id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::ProductNotFound,
                    format!("Product {} is not a digital deliverable", cmd.product_id),
                )
            })?;

        let url = link
            .register_download(now)
            .map_err(denied_to_domain)?
            .to_string();
        let remaining = link.remaining();
        let expires_at = link.expires_at;

        self.orders.update(&order).await?;

        tracing::debug!(
            order_id = %cmd.order_id,
            product_id = %cmd.product_id,
            remaining,
            "download granted"
        );
        Ok(DownloadItemResult {
            url,
            remaining_downloads: remaining,
            expires_at,
        })
    }

    /// Issues a fresh link for a paid digital line that is missing one.
    async fn backfill_link(
        &self,
        order: &mut crate::domain::order::Order,
        product_id: ProductId,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let product = self
            .catalog
            .find_product(&product_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::ProductNotFound,
                    format!("Product {} not found", product_id),
                )
            })?;
        if let Some(digital) = product.digital {
            tracing::info!(
                order_id = %order.id,
                product_id = %product_id,
                "backfilling missing download link"
            );
            order.upsert_download_link(
                DownloadLink::issue(product_id, digital.file_url, now, digital.max_downloads),
                now,
            );
        }
        Ok(())
    }
}

fn denied_to_domain(denied: DownloadDenied) -> DomainError {
    match denied {
        DownloadDenied::NotPaid => {
            DomainError::new(ErrorCode::NotPaid, "Order has not been paid")
        }
        DownloadDenied::LimitExceeded => DomainError::new(
            ErrorCode::DownloadLimitExceeded,
            "Download limit reached for this item",
        ),
        DownloadDenied::Expired => DomainError::new(
            ErrorCode::DownloadLinkExpired,
            "Download link has expired",
        ),
    }
}
