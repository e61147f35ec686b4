//! Refund HTTP adapter.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::RefundAppState;
pub use routes::refund_router;
