//! Fulfillment HTTP adapter.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::FulfillmentAppState;
pub use routes::fulfillment_router;
