//! HTTP DTOs for refund endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{RequestRefundResult, ReviewRefundResult};
use crate::domain::foundation::{Money, ProductId};
use crate::domain::refund::{RefundLine, RefundType};

/// Request a refund against an order.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundRequestBody {
    pub order_id: String,
    pub refund_type: RefundType,
    /// Per-line breakdown in cents; required for partial refunds.
    #[serde(default)]
    pub lines: Vec<RefundLineBody>,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundLineBody {
    pub product_id: ProductId,
    pub amount_cents: i64,
}

impl From<RefundLineBody> for RefundLine {
    fn from(body: RefundLineBody) -> Self {
        Self {
            product_id: body.product_id,
            amount: Money::from_cents(body.amount_cents),
        }
    }
}

/// Reviewer decision on a pending refund.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRefundBody {
    pub decision: ReviewDecisionBody,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecisionBody {
    Approve,
    Reject,
}

/// Created or updated refund request.
#[derive(Debug, Clone, Serialize)]
pub struct RefundResponse {
    pub refund_id: String,
    pub status: String,
    pub amount_cents: i64,
    pub auto_approved: bool,
}

impl From<RequestRefundResult> for RefundResponse {
    fn from(result: RequestRefundResult) -> Self {
        Self {
            refund_id: result.refund_id.to_string(),
            status: result.status.as_str().to_string(),
            amount_cents: result.amount.as_cents(),
            auto_approved: result.auto_approved,
        }
    }
}

/// Outcome of a refund review.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewRefundResponse {
    pub refund_id: String,
    pub status: String,
}

impl From<ReviewRefundResult> for ReviewRefundResponse {
    fn from(result: ReviewRefundResult) -> Self {
        Self {
            refund_id: result.refund_id.to_string(),
            status: result.status.as_str().to_string(),
        }
    }
}
