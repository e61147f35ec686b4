//! HTTP adapters - REST API implementations.
//!
//! Each route group has its own adapter in the dto/handlers/routes
//! shape; error mapping and identity extraction are shared.

pub mod admin;
pub mod cancellation;
pub mod checkout;
pub mod error;
pub mod fulfillment;
pub mod middleware;
pub mod refund;
pub mod webhook;

pub use admin::{admin_router, AdminAppState};
pub use cancellation::{cancellation_router, CancellationAppState};
pub use checkout::{checkout_router, CheckoutAppState};
pub use error::{ApiError, ErrorResponse};
pub use fulfillment::{fulfillment_router, FulfillmentAppState};
pub use refund::{refund_router, RefundAppState};
pub use webhook::{webhook_router, WebhookAppState};
