//! Gateway webhook HTTP adapter.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{WebhookAppState, SIGNATURE_HEADER};
pub use routes::webhook_router;
