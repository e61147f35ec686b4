//! Checkout HTTP adapter.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::CheckoutAppState;
pub use routes::checkout_router;
