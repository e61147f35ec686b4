//! Checkout handlers.

mod initiate_payment;

pub use initiate_payment::{InitiatePaymentCommand, InitiatePaymentHandler, InitiatePaymentResult};
