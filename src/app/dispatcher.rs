//! Command dispatcher: bus message → relay action.
//!
//! Stateless: every message re-runs the full pulse sequence, redundant ones
//! included.  Messages are not filtered by topic; the relay node subscribes
//! to a single topic.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::StatefulOutputPin;
use log::{error, warn};

use crate::app::commands::Command;
use crate::app::events::NodeEvent;
use crate::app::ports::{BusMessage, EventSink};
use crate::drivers::relay::RelayActuator;
use crate::error::Error;

pub struct CommandDispatcher<P, D> {
    relay: RelayActuator<P, D>,
}

impl<P, D> CommandDispatcher<P, D>
where
    P: StatefulOutputPin,
    D: DelayNs,
{
    pub fn new(relay: RelayActuator<P, D>) -> Self {
        Self { relay }
    }

    pub fn relay(&self) -> &RelayActuator<P, D> {
        &self.relay
    }

    pub fn relay_mut(&mut self) -> &mut RelayActuator<P, D> {
        &mut self.relay
    }

    pub fn into_relay(self) -> RelayActuator<P, D> {
        self.relay
    }

    /// Apply one message.  Returns the command it mapped to.
    pub fn dispatch(&mut self, msg: &BusMessage, sink: &mut impl EventSink) -> Command {
        let command = Command::parse(&msg.payload);
        let driven = match command {
            Command::RelayOn => self.relay.pulse_on(),
            Command::RelayOff => self.relay.pulse_off(),
            Command::Unknown => {
                let payload = msg.payload_text();
                warn!("Relay: {} '{}', pin left unchanged", Error::UnknownCommand, payload);
                sink.emit(&NodeEvent::CommandIgnored { payload });
                return command;
            }
        };

        match driven {
            Ok(level) => sink.emit(&NodeEvent::RelayDriven { command, level }),
            Err(e) => {
                error!("Relay: {:?} failed: {}", command, e);
                sink.emit(&NodeEvent::Fault(Error::from(e)));
            }
        }
        command
    }
}
