//! HTTP outbound adapter.
//!
//! A thin reqwest implementation of the `AccountGateway` port.

mod dto;
mod http_gateway;

pub use http_gateway::{DEFAULT_USER_AGENT, HttpAccountGateway, HttpGatewayBuildError};
