//! Shared HTTP error mapping.
//!
//! Every route group funnels `DomainError` through [`ApiError`], which
//! maps the error code onto a status and a stable JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode};

/// JSON error body returned by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Stable code for programmatic handling.
    pub error_code: String,
    /// Human-readable message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// Wrapper turning a `DomainError` into an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    if code.is_not_found() {
        return StatusCode::NOT_FOUND;
    }
    if code.is_conflict() {
        return StatusCode::CONFLICT;
    }
    match code {
        ErrorCode::ValidationFailed
        | ErrorCode::EmptyField
        | ErrorCode::OutOfRange
        | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,
        ErrorCode::InvalidStateTransition
        | ErrorCode::NotPaid
        | ErrorCode::DownloadLimitExceeded
        | ErrorCode::DownloadLinkExpired
        | ErrorCode::RefundWindowClosed
        | ErrorCode::PartialRefundNotAllowed
        | ErrorCode::RefundExceedsRefundable => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::GatewayRejected => StatusCode::PAYMENT_REQUIRED,
        ErrorCode::GatewayOutcomeUnknown => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.code);

        if status.is_server_error() {
            tracing::error!(code = %self.0.code, message = %self.0.message, "request failed");
        }

        // Internal detail stays out of the response body for 5xx.
        let body = if status.is_server_error() {
            ErrorResponse::new(self.0.code.to_string(), "Internal server error")
        } else {
            let mut response = ErrorResponse::new(self.0.code.to_string(), self.0.message);
            if !self.0.details.is_empty() {
                response.details = serde_json::to_value(&self.0.details).ok();
            }
            response
        };

        (status, Json(body)).into_response()
    }
}
