//! Payment gateway adapters.

mod http_gateway;
mod ipn;
mod mock;

pub use http_gateway::{HttpGateway, HttpGatewayConfig};
pub use ipn::{IpnError, IpnSignature, IpnVerifier};
pub use mock::MockGateway;
