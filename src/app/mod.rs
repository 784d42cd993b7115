//! Application core — pure domain logic, zero I/O.
//!
//! Network bootstrapping, the bounded bus client, the relay command
//! dispatcher and the backend reporter, composed into one service per node.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod bus;
pub mod commands;
pub mod decision;
pub mod dispatcher;
pub mod events;
pub mod network;
pub mod ports;
pub mod reporter;
pub mod service;
pub mod tag;
