//! Shared fakes for the node integration tests.
//!
//! The network side uses the library's own simulation adapters; this file
//! adds what they do not cover: a virtual clock, a recording event sink,
//! a recording relay pin and scripted backends.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};
use rfidgate::app::events::NodeEvent;
use rfidgate::app::ports::{BackendPort, EventSink, HttpError, HttpResponse, TimePort};
use rfidgate::config::{NetworkCredential, NodeConfig};

// ── Virtual clock ─────────────────────────────────────────────

/// Sleeping advances `now` instantly.
#[derive(Debug, Default)]
pub struct FakeClock {
    pub now: u64,
    pub sleeps: Vec<u32>,
}

impl TimePort for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.now += u64::from(ms);
        self.sleeps.push(ms);
    }
}

// ── Event recording ───────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<NodeEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&NodeEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &NodeEvent) {
        self.events.push(event.clone());
    }
}

// ── Relay pin ─────────────────────────────────────────────────

/// Records every level written; `true` = HIGH.  Powers up LOW like a
/// freshly configured ESP32 output.
#[derive(Debug, Default)]
pub struct MockPin {
    pub high: bool,
    pub writes: Vec<bool>,
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        self.writes.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        self.writes.push(true);
        Ok(())
    }
}

impl StatefulOutputPin for MockPin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high)
    }
}

/// Sums requested delays without sleeping.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub total_ms: u64,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms += u64::from(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
    }
}

// ── Scripted backend ──────────────────────────────────────────

/// Answers every request the same way.
pub struct ScriptedBackend {
    pub reply: Result<HttpResponse, HttpError>,
    pub requests: usize,
}

#[allow(dead_code)]
impl ScriptedBackend {
    pub fn status(status: u16, body: &str) -> Self {
        Self {
            reply: Ok(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
            requests: 0,
        }
    }

    pub fn failing(err: HttpError) -> Self {
        Self {
            reply: Err(err),
            requests: 0,
        }
    }
}

impl BackendPort for ScriptedBackend {
    fn post_json(&mut self, _url: &str, _body: &[u8], _timeout_ms: u32) -> Result<HttpResponse, HttpError> {
        self.requests += 1;
        self.reply.clone()
    }
}

// ── Configs ───────────────────────────────────────────────────

pub fn home() -> NetworkCredential {
    NetworkCredential::new("Home", "homepass1")
}

pub fn backup() -> NetworkCredential {
    NetworkCredential::new("Backup", "backuppass")
}

pub fn node_config(prefix: &str) -> NodeConfig {
    let mut cfg = NodeConfig {
        networks: vec![home(), backup()],
        ..Default::default()
    };
    cfg.broker.client_id_prefix = prefix.into();
    cfg
}
