//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one node end to end
//! against the host simulation adapters.  All tests run on the host
//! (x86_64) with no real hardware and no wall-clock sleeps.

#![cfg(not(target_os = "espidf"))]

mod link_recovery_tests;
mod mock_net;
mod reader_node_tests;
mod relay_node_tests;
