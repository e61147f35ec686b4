//! Orderflow - payment-to-fulfillment consistency engine for a digital
//! storefront.
//!
//! Orders, payments, entitlements, refunds and cancellations are kept
//! consistent across gateway callbacks that may arrive out of order,
//! duplicated, or not at all.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
