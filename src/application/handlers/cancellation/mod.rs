//! Cancellation handlers.

mod process_cancellation;
mod request_cancellation;

pub use process_cancellation::{
    CancellationDecision, ProcessCancellationCommand, ProcessCancellationHandler,
    ProcessCancellationResult,
};
pub use request_cancellation::{
    RequestCancellationCommand, RequestCancellationHandler, RequestCancellationResult,
};
