//! Refund engine handlers: request, review, execute.

mod execute_refund;
mod request_refund;
mod review_refund;

pub use execute_refund::{ExecuteRefundCommand, ExecuteRefundHandler, ExecuteRefundResult};
pub use request_refund::{RequestRefundCommand, RequestRefundHandler, RequestRefundResult};
pub use review_refund::{
    ReviewDecision, ReviewRefundCommand, ReviewRefundHandler, ReviewRefundResult,
};
