//! Driving adapters that invoke the account synchronisation service.

pub mod cli;
