//! Node services: the hexagonal core of each firmware image.
//!
//! [`ReaderNodeService`] and [`RelayNodeService`] own their adapters and
//! run one cooperative loop each.  Time and the event sink are injected at
//! the call site, so the whole loop runs against fakes on the host.
//!
//! ```text
//!  TagReaderPort ──▶ ┌───────────────────┐ ──▶ BackendPort
//!                    │ ReaderNodeService │ ──▶ BusPort (publish)
//!                    └───────────────────┘
//!
//!  BusPort (poll) ──▶ ┌───────────────────┐ ──▶ relay pin
//!                     │ RelayNodeService  │
//!                     └───────────────────┘
//! ```
//!
//! Every tick starts with the same upkeep: bounded Wi-Fi maintenance, then
//! the broker session.  After a Wi-Fi restore the session is rebuilt
//! unconditionally since the old one cannot have survived.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::StatefulOutputPin;
use log::{error, info, warn};

use crate::app::bus::BusClient;
use crate::app::decision::payload_for;
use crate::app::dispatcher::CommandDispatcher;
use crate::app::events::{NodeEvent, NodeRole};
use crate::app::network::{LinkOutcome, NetworkBootstrapper};
use crate::app::ports::{BackendPort, BusPort, ConnectivityPort, EventSink, TagReaderPort, TimePort};
use crate::app::reporter::Reporter;
use crate::app::tag::TagHex;
use crate::config::{NodeConfig, TimingConfig};
use crate::drivers::relay::RelayActuator;
use crate::error::Error;

/// What one tick did beyond upkeep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    /// A tag was read; `published` is the payload sent, if any.
    TagHandled { tag: TagHex, published: Option<String> },
    /// Number of bus messages handed to the relay.
    Dispatched(usize),
}

fn upkeep<W: ConnectivityPort, B: BusPort>(
    network: &mut NetworkBootstrapper<W>,
    bus: &mut BusClient<B>,
    timing: &TimingConfig,
    time: &mut impl TimePort,
    sink: &mut impl EventSink,
) {
    let link = network.maintain(
        timing.wifi_reconnect_budget_ms,
        timing.wifi_retry_interval_ms,
        time,
        sink,
    );
    if link == LinkOutcome::Restored {
        if bus.reconnect_bounded(time, sink).is_err() {
            warn!("MQTT: no session after WiFi restore, retrying next tick");
        }
    } else {
        bus.ensure_connected(time, sink);
    }
}

// ───────────────────────────────────────────────────────────────
// Reader node
// ───────────────────────────────────────────────────────────────

pub struct ReaderNodeService<W, B, H, R> {
    network: NetworkBootstrapper<W>,
    bus: BusClient<B>,
    backend: H,
    reader: R,
    reporter: Reporter,
    topic: String,
    timing: TimingConfig,
}

impl<W, B, H, R> ReaderNodeService<W, B, H, R>
where
    W: ConnectivityPort,
    B: BusPort,
    H: BackendPort,
    R: TagReaderPort,
{
    pub fn new(config: &NodeConfig, wifi: W, bus: B, client_id: String, backend: H, reader: R) -> Self {
        Self {
            network: NetworkBootstrapper::new(wifi, config.networks.clone()),
            bus: BusClient::new(bus, client_id, config.broker.url(), &config.timing),
            backend,
            reader,
            reporter: Reporter::new(&config.backend),
            topic: config.broker.topic.clone(),
            timing: config.timing.clone(),
        }
    }

    pub fn network(&self) -> &NetworkBootstrapper<W> {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut NetworkBootstrapper<W> {
        &mut self.network
    }

    pub fn bus(&self) -> &BusClient<B> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut BusClient<B> {
        &mut self.bus
    }

    pub fn backend_mut(&mut self) -> &mut H {
        &mut self.backend
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Block until Wi-Fi is up, then try the broker once (bounded).
    pub fn start(&mut self, time: &mut impl TimePort, sink: &mut impl EventSink) {
        self.network.connect(self.timing.wifi_connect_poll_ms, time, sink);
        if self.bus.reconnect_bounded(time, sink).is_err() {
            warn!("Reader: starting without a broker session");
        }
        info!("Reader: ready, publishing decisions on '{}'", self.topic);
        sink.emit(&NodeEvent::Ready(NodeRole::Reader));
    }

    pub fn tick(&mut self, time: &mut impl TimePort, sink: &mut impl EventSink) -> TickOutcome {
        upkeep(&mut self.network, &mut self.bus, &self.timing, time, sink);
        self.bus.poll(|_| {});

        let Some(tag) = self.reader.poll_tag() else {
            time.sleep_ms(self.timing.reader_idle_ms);
            return TickOutcome::Idle;
        };

        let hex = tag.to_hex();
        info!("RFID: tag detected, UID {}", hex);
        sink.emit(&NodeEvent::TagScanned(hex.clone()));

        let published = if self.network.is_connected() {
            let outcome = self.reporter.decide(&tag, &mut self.backend);
            if let Err(e) = &outcome {
                sink.emit(&NodeEvent::Fault(*e));
            }
            let payload = payload_for(&outcome);
            match self.bus.publish(&self.topic, payload.as_bytes(), time, sink) {
                Ok(()) => {
                    info!("MQTT: published '{}' to '{}'", payload, self.topic);
                    sink.emit(&NodeEvent::DecisionPublished {
                        tag: hex.clone(),
                        payload: payload.clone(),
                    });
                    Some(payload)
                }
                Err(e) => {
                    warn!("MQTT: decision '{}' for {} dropped: {}", payload, hex, e);
                    sink.emit(&NodeEvent::Fault(e));
                    None
                }
            }
        } else {
            warn!("RFID: {}, tag {} not reported", Error::NetworkUnavailable, hex);
            sink.emit(&NodeEvent::Fault(Error::NetworkUnavailable));
            None
        };

        self.reader.halt();
        time.sleep_ms(self.timing.tag_cooldown_ms);
        TickOutcome::TagHandled { tag: hex, published }
    }
}

// ───────────────────────────────────────────────────────────────
// Relay node
// ───────────────────────────────────────────────────────────────

pub struct RelayNodeService<W, B, P, D> {
    network: NetworkBootstrapper<W>,
    bus: BusClient<B>,
    dispatcher: CommandDispatcher<P, D>,
    topic: String,
    timing: TimingConfig,
}

impl<W, B, P, D> RelayNodeService<W, B, P, D>
where
    W: ConnectivityPort,
    B: BusPort,
    P: StatefulOutputPin,
    D: DelayNs,
{
    pub fn new(config: &NodeConfig, wifi: W, bus: B, client_id: String, pin: P, delay: D) -> Self {
        let relay = RelayActuator::new(pin, delay, config.relay.clone());
        Self {
            network: NetworkBootstrapper::new(wifi, config.networks.clone()),
            bus: BusClient::new(bus, client_id, config.broker.url(), &config.timing),
            dispatcher: CommandDispatcher::new(relay),
            topic: config.broker.topic.clone(),
            timing: config.timing.clone(),
        }
    }

    pub fn network_mut(&mut self) -> &mut NetworkBootstrapper<W> {
        &mut self.network
    }

    pub fn bus(&self) -> &BusClient<B> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut BusClient<B> {
        &mut self.bus
    }

    pub fn relay(&self) -> &RelayActuator<P, D> {
        self.dispatcher.relay()
    }

    pub fn relay_mut(&mut self) -> &mut RelayActuator<P, D> {
        self.dispatcher.relay_mut()
    }

    /// Park the relay OFF, then bring up Wi-Fi and the subscription.
    pub fn start(&mut self, time: &mut impl TimePort, sink: &mut impl EventSink) {
        if let Err(e) = self.dispatcher.relay_mut().init() {
            error!("Relay: init failed: {}", e);
            sink.emit(&NodeEvent::Fault(Error::from(e)));
        }
        self.network.connect(self.timing.wifi_connect_poll_ms, time, sink);
        self.bus.subscribe(&self.topic);
        if self.bus.reconnect_bounded(time, sink).is_err() {
            warn!("Relay: starting without a broker session");
        }
        info!("Relay: ready, listening on '{}'", self.topic);
        sink.emit(&NodeEvent::Ready(NodeRole::Relay));
    }

    pub fn tick(&mut self, time: &mut impl TimePort, sink: &mut impl EventSink) -> TickOutcome {
        upkeep(&mut self.network, &mut self.bus, &self.timing, time, sink);

        let dispatcher = &mut self.dispatcher;
        let delivered = self.bus.poll(|msg| {
            dispatcher.dispatch(msg, sink);
        });

        time.sleep_ms(self.timing.relay_idle_ms);
        if delivered == 0 {
            TickOutcome::Idle
        } else {
            TickOutcome::Dispatched(delivered)
        }
    }
}
