//! Fuzz target: `Command::parse` (relay inbound path)
//!
//! Only the exact one-byte payloads `"1"` and `"0"` may map to a relay
//! action.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use rfidgate::app::commands::Command;

fuzz_target!(|data: &[u8]| {
    match Command::parse(data) {
        Command::RelayOn => assert_eq!(data, b"1"),
        Command::RelayOff => assert_eq!(data, b"0"),
        Command::Unknown => assert!(data != b"1" && data != b"0"),
    }
});
