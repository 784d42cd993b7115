//! Outbound node events.
//!
//! The node services emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them (serial log in production, a recording sink
//! in tests).

use crate::app::commands::Command;
use crate::app::ports::LinkInfo;
use crate::app::tag::TagHex;
use crate::drivers::relay::RelayLevel;
use crate::error::Error;

/// Which firmware image is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Reader,
    Relay,
}

/// Structured events emitted by the node services.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// Startup sequence finished; the main loop is about to run.
    Ready(NodeRole),

    /// Wi-Fi associated (at boot or after a loss).
    LinkUp(LinkInfo),

    /// Wi-Fi dropped and a bounded reconnect is starting.
    LinkLost,

    /// The reconnect budget ran out; the loop continues offline.
    LinkRestoreFailed { budget_ms: u32 },

    /// Broker session established.
    BusConnected { client_id: String, attempt: u32 },

    /// Every attempt of one reconnect cycle failed.
    BusUnreachable { attempts: u32 },

    /// A command was carried out on the relay.
    RelayDriven { command: Command, level: RelayLevel },

    /// A payload that maps to no command.
    CommandIgnored { payload: String },

    /// A card was presented to the reader.
    TagScanned(TagHex),

    /// A decision was published for the last tag.
    DecisionPublished { tag: TagHex, payload: String },

    /// A failure absorbed by the loop.
    Fault(Error),
}
