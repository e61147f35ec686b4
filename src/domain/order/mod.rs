//! Order aggregate and its value objects.

mod aggregate;
mod line_item;
mod pricing;
mod status;

pub use aggregate::{Order, StatusHistoryEntry, TrackingInfo};
pub use line_item::{ItemRef, LineItem};
pub use pricing::PricingSnapshot;
pub use status::{OrderPriority, OrderStatus};
