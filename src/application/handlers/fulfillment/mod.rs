//! Fulfillment handlers: verification callbacks and entitlement
//! consumption.

mod download_item;
mod verify_payment;

pub use download_item::{DownloadItemCommand, DownloadItemHandler, DownloadItemResult};
pub use verify_payment::{VerifyPaymentCommand, VerifyPaymentHandler, VerifyPaymentResult};
