//! Account gateway and synchronisation cache for the banking demo REST API.
//!
//! The crate keeps a local, keyed view of remote accounts and decides after
//! every write which entries must be refetched. Layout:
//!
//! - [`domain`]: records, the gateway port, the synchronisation store and the
//!   service applying the invalidation rules
//! - [`outbound`]: reqwest adapter for the Account Service
//! - [`inbound`]: clap command-line driving adapter
//! - [`config`]: OrthoConfig-backed settings

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
