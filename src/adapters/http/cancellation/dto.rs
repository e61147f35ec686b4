//! HTTP DTOs for cancellation endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{ProcessCancellationResult, RequestCancellationResult};
use crate::domain::refund::{CancellationMode, CancellationScope};

/// Request to cancel an order or one of its subscription grants.
#[derive(Debug, Clone, Deserialize)]
pub struct CancellationRequestBody {
    /// Tagged by `target`: `order` or `subscription`.
    pub scope: CancellationScope,
    /// Tagged by `mode`: `immediate`, `end_of_period`, `scheduled`.
    pub mode: CancellationMode,
    pub reason: String,
}

/// Reviewer decision on a requested cancellation.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessCancellationBody {
    pub decision: CancellationDecisionBody,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancellationDecisionBody {
    Approve,
    Reject,
}

/// Created cancellation request.
#[derive(Debug, Clone, Serialize)]
pub struct CancellationResponse {
    pub cancellation_id: String,
    pub status: String,
}

impl From<RequestCancellationResult> for CancellationResponse {
    fn from(result: RequestCancellationResult) -> Self {
        Self {
            cancellation_id: result.cancellation_id.to_string(),
            status: result.status.as_str().to_string(),
        }
    }
}

/// Outcome of processing a cancellation.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessCancellationResponse {
    pub cancellation_id: String,
    pub status: String,
    /// Refund request spawned by an approved, refund-eligible
    /// cancellation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawned_refund: Option<String>,
}

impl From<ProcessCancellationResult> for ProcessCancellationResponse {
    fn from(result: ProcessCancellationResult) -> Self {
        Self {
            cancellation_id: result.cancellation_id.to_string(),
            status: result.status.as_str().to_string(),
            spawned_refund: result.spawned_refund.map(|id| id.to_string()),
        }
    }
}
