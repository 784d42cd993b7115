//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one line per [`NodeEvent`] to the
//! ESP-IDF logger (UART in production).

use log::{info, warn};

use crate::app::events::NodeEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`NodeEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &NodeEvent) {
        match event {
            NodeEvent::Ready(role) => info!("START | {:?} node ready", role),
            NodeEvent::LinkUp(link) => info!("LINK  | up {}", link),
            NodeEvent::LinkLost => warn!("LINK  | lost"),
            NodeEvent::LinkRestoreFailed { budget_ms } => {
                warn!("LINK  | not restored within {} ms, continuing offline", budget_ms);
            }
            NodeEvent::BusConnected { client_id, attempt } => {
                info!("BUS   | connected as {} (attempt {})", client_id, attempt);
            }
            NodeEvent::BusUnreachable { attempts } => {
                warn!("BUS   | unreachable after {} attempts", attempts);
            }
            NodeEvent::RelayDriven { command, level } => {
                info!("RELAY | {:?} -> {:?} ({})", command, level, level.pin_label());
            }
            NodeEvent::CommandIgnored { payload } => {
                warn!("RELAY | ignored payload '{}'", payload);
            }
            NodeEvent::TagScanned(tag) => info!("TAG   | {}", tag),
            NodeEvent::DecisionPublished { tag, payload } => {
                info!("TAG   | {} -> '{}'", tag, payload);
            }
            NodeEvent::Fault(e) => warn!("FAULT | {}", e),
        }
    }
}
