//! HTTP DTOs for admin endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{BulkOperation, ExecuteBulkResult};
use crate::domain::foundation::OrderId;

/// All-or-nothing bulk operation over a set of orders.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkRequestBody {
    /// Tagged by `operation`: `update_status`, `set_priority`,
    /// `cancel`, `refund`.
    #[serde(flatten)]
    pub operation: BulkOperation,
    pub order_ids: Vec<OrderId>,
}

/// Outcome of an applied bulk operation.
#[derive(Debug, Clone, Serialize)]
pub struct BulkResponse {
    pub bulk_id: String,
    pub orders_updated: usize,
    pub refunds_spawned: Vec<String>,
}

impl From<ExecuteBulkResult> for BulkResponse {
    fn from(result: ExecuteBulkResult) -> Self {
        Self {
            bulk_id: result.bulk_id.to_string(),
            orders_updated: result.orders_updated,
            refunds_spawned: result
                .refunds_spawned
                .into_iter()
                .map(|id| id.to_string())
                .collect(),
        }
    }
}
