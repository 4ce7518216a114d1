//! Outbound adapters implementing domain ports.
//!
//! - **http**: reqwest-backed Account Service gateway speaking JSON over REST
//!
//! Adapters translate between domain types and wire representations. They
//! contain no synchronisation logic.

pub mod http;
