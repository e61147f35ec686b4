//! HTTP handlers for fulfillment endpoints.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;

use crate::application::handlers::{DownloadItemCommand, DownloadItemHandler};
use crate::domain::foundation::{OrderId, ProductId};
use crate::ports::{Catalog, OrderRepository};

use super::super::error::ApiError;
use super::super::middleware::AuthenticatedUser;
use super::dto::DownloadResponse;

/// Shared state for fulfillment routes.
#[derive(Clone)]
pub struct FulfillmentAppState {
    pub orders: Arc<dyn OrderRepository>,
    pub catalog: Arc<dyn Catalog>,
}

impl FulfillmentAppState {
    fn download_item_handler(&self) -> DownloadItemHandler {
        DownloadItemHandler::new(self.orders.clone(), self.catalog.clone())
    }
}

/// POST /api/orders/:id/download/:product_id - consume one download.
pub async fn download_item(
    State(state): State<FulfillmentAppState>,
    _user: AuthenticatedUser,
    Path((order_id, product_id)): Path<(OrderId, ProductId)>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.download_item_handler();
    let cmd = DownloadItemCommand {
        order_id,
        product_id,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(DownloadResponse::from(result)))
}
