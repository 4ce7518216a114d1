//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_gateway;
mod cache_key;

#[cfg(test)]
pub use account_gateway::MockAccountGateway;
pub use account_gateway::{AccountGateway, AccountGatewayError};
pub use cache_key::AccountCacheKey;
