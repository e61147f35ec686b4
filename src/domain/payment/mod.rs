//! Payment aggregate and transaction identifiers.

mod aggregate;
mod status;
mod transaction_id;

pub use aggregate::{GatewayMetadata, Payment};
pub use status::PaymentStatus;
pub use transaction_id::TransactionId;
