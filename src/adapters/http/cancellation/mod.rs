//! Cancellation HTTP adapter.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::CancellationAppState;
pub use routes::cancellation_router;
