//! Command handlers.
//!
//! Each handler is a struct over `Arc<dyn Port>` dependencies with a
//! single `handle(command) -> Result<_, DomainError>` method. Handlers
//! own the orchestration; all business rules live in the domain layer.

pub mod automation;
pub mod bulk;
pub mod cancellation;
pub mod checkout;
pub mod fulfillment;
pub mod refund;

pub use automation::AutomationEngine;
pub use bulk::{BulkOperation, ExecuteBulkCommand, ExecuteBulkHandler, ExecuteBulkResult};
pub use cancellation::{
    CancellationDecision, ProcessCancellationCommand, ProcessCancellationHandler,
    ProcessCancellationResult, RequestCancellationCommand, RequestCancellationHandler,
    RequestCancellationResult,
};
pub use checkout::{InitiatePaymentCommand, InitiatePaymentHandler, InitiatePaymentResult};
pub use fulfillment::{
    DownloadItemCommand, DownloadItemHandler, DownloadItemResult, VerifyPaymentCommand,
    VerifyPaymentHandler, VerifyPaymentResult,
};
pub use refund::{
    ExecuteRefundCommand, ExecuteRefundHandler, ExecuteRefundResult, RequestRefundCommand,
    RequestRefundHandler, RequestRefundResult, ReviewDecision, ReviewRefundCommand,
    ReviewRefundHandler, ReviewRefundResult,
};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::GatewayError;

/// Maps a gateway failure onto a domain error.
///
/// Callers on money paths must branch on `Rejected` vs the rest before
/// reaching for this; only definitive rejections may fail local state.
pub fn gateway_to_domain(err: GatewayError) -> DomainError {
    match err {
        GatewayError::Rejected(reason) => {
            DomainError::new(ErrorCode::GatewayRejected, reason)
        }
        GatewayError::OutcomeUnknown(reason) => {
            DomainError::new(ErrorCode::GatewayOutcomeUnknown, reason)
        }
        GatewayError::Protocol(reason) => DomainError::new(
            ErrorCode::InternalError,
            format!("gateway protocol error: {}", reason),
        ),
    }
}
