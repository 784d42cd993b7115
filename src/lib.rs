//! rfidgate firmware library.
//!
//! Shared by the `reader-node` and `relay-node` binaries and exposed for
//! host integration tests.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
