//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    EmptyField,
    OutOfRange,
    InvalidFormat,

    // Not found errors
    OrderNotFound,
    PaymentNotFound,
    RefundRequestNotFound,
    CancellationNotFound,
    ProductNotFound,
    PlanNotFound,
    RuleNotFound,

    // Conflict errors
    DuplicatePayment,
    DuplicateTransactionId,
    AlreadyTerminal,

    // State errors
    InvalidStateTransition,
    NotPaid,
    DownloadLimitExceeded,
    DownloadLinkExpired,
    RefundWindowClosed,
    PartialRefundNotAllowed,
    RefundExceedsRefundable,

    // Gateway errors
    GatewayRejected,
    GatewayOutcomeUnknown,

    // Infrastructure errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// True for errors that describe a resource lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ErrorCode::OrderNotFound
                | ErrorCode::PaymentNotFound
                | ErrorCode::RefundRequestNotFound
                | ErrorCode::CancellationNotFound
                | ErrorCode::ProductNotFound
                | ErrorCode::PlanNotFound
                | ErrorCode::RuleNotFound
        )
    }

    /// True for conflicts with an existing resource or terminal state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ErrorCode::DuplicatePayment
                | ErrorCode::DuplicateTransactionId
                | ErrorCode::AlreadyTerminal
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::EmptyField => "EMPTY_FIELD",
            ErrorCode::OutOfRange => "OUT_OF_RANGE",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::OrderNotFound => "ORDER_NOT_FOUND",
            ErrorCode::PaymentNotFound => "PAYMENT_NOT_FOUND",
            ErrorCode::RefundRequestNotFound => "REFUND_REQUEST_NOT_FOUND",
            ErrorCode::CancellationNotFound => "CANCELLATION_NOT_FOUND",
            ErrorCode::ProductNotFound => "PRODUCT_NOT_FOUND",
            ErrorCode::PlanNotFound => "PLAN_NOT_FOUND",
            ErrorCode::RuleNotFound => "RULE_NOT_FOUND",
            ErrorCode::DuplicatePayment => "DUPLICATE_PAYMENT",
            ErrorCode::DuplicateTransactionId => "DUPLICATE_TRANSACTION_ID",
            ErrorCode::AlreadyTerminal => "ALREADY_TERMINAL",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::NotPaid => "NOT_PAID",
            ErrorCode::DownloadLimitExceeded => "DOWNLOAD_LIMIT_EXCEEDED",
            ErrorCode::DownloadLinkExpired => "DOWNLOAD_LINK_EXPIRED",
            ErrorCode::RefundWindowClosed => "REFUND_WINDOW_CLOSED",
            ErrorCode::PartialRefundNotAllowed => "PARTIAL_REFUND_NOT_ALLOWED",
            ErrorCode::RefundExceedsRefundable => "REFUND_EXCEEDS_REFUNDABLE",
            ErrorCode::GatewayRejected => "GATEWAY_REJECTED",
            ErrorCode::GatewayOutcomeUnknown => "GATEWAY_OUTCOME_UNKNOWN",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            details: HashMap::new(),
        }
        .with_detail("field", field.into())
    }

    /// Creates a state error for an operation invalid in the current status.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidStateTransition, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        let code = match err {
            ValidationError::EmptyField { .. } => ErrorCode::EmptyField,
            ValidationError::OutOfRange { .. } => ErrorCode::OutOfRange,
            ValidationError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
        };
        DomainError::new(code, err.to_string())
    }
}
