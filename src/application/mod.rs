//! Application layer: command handlers and the background job runner.

pub mod handlers;
pub mod jobs;

pub use jobs::JobRunner;
