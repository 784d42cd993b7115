//! Fuzz target: `AccessDecision::from_json` (backend response path)
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - The published payload is never empty
//! - A decoded decision publishes its status verbatim
//!
//! cargo fuzz run fuzz_decision_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use rfidgate::app::decision::{AccessDecision, DENY_PAYLOAD, payload_for};

fuzz_target!(|data: &[u8]| {
    let outcome = AccessDecision::from_json(data);
    let payload = payload_for(&outcome);
    assert!(!payload.is_empty());

    match &outcome {
        Ok(decision) => assert_eq!(payload, decision.status.to_string()),
        Err(_) => assert_eq!(payload, DENY_PAYLOAD),
    }
});
