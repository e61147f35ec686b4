//! Route configuration for fulfillment endpoints.

use axum::routing::post;
use axum::Router;

use super::handlers::{download_item, FulfillmentAppState};

/// Creates the fulfillment router.
///
/// Routes:
/// - `POST /api/orders/:id/download/:product_id` - Consume one download
pub fn fulfillment_router() -> Router<FulfillmentAppState> {
    Router::new().route(
        "/api/orders/:id/download/:product_id",
        post(download_item),
    )
}
