//! PostgreSQL adapter implementations.
//!
//! Aggregates persist as JSONB documents beside the scalar columns the
//! queries filter on. The payment repository implements its
//! compare-and-set transitions with `SELECT ... FOR UPDATE` inside a
//! transaction, and `update_all` wraps the batch in one transaction
//! for the bulk engine's all-or-nothing write.

mod job_queue;
mod order_repository;
mod payment_repository;
mod refund_repository;

pub use job_queue::PostgresJobQueue;
pub use order_repository::PostgresOrderRepository;
pub use payment_repository::PostgresPaymentRepository;
pub use refund_repository::{PostgresCancellationRepository, PostgresRefundRepository};

use crate::domain::foundation::{DomainError, ErrorCode};

/// Maps an sqlx failure onto the domain's database error code.
pub(crate) fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
}

/// Deserializes a stored aggregate document.
pub(crate) fn from_doc<T: serde::de::DeserializeOwned>(
    context: &str,
    doc: serde_json::Value,
) -> Result<T, DomainError> {
    serde_json::from_value(doc).map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("{}: corrupt stored document: {}", context, e),
        )
    })
}

/// Serializes an aggregate into its stored document.
pub(crate) fn to_doc<T: serde::Serialize>(
    context: &str,
    value: &T,
) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(value).map_err(|e| {
        DomainError::new(
            ErrorCode::InternalError,
            format!("{}: serializing document: {}", context, e),
        )
    })
}
