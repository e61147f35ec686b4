//! Adapters - implementations of the outbound ports.
//!
//! - `gateway` - payment gateway client (HTTP + mock) and IPN verification
//! - `http` - REST API surface (axum)
//! - `memory` - in-memory port implementations for tests
//! - `notifier` - notification delivery
//! - `postgres` - sqlx-backed repositories and job store

pub mod gateway;
pub mod http;
pub mod memory;
pub mod notifier;
pub mod postgres;
