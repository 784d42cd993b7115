//! Bus client wrapper: bounded reconnect around a [`BusPort`].
//!
//! Owns the session identity and the set of registered topics.  Every
//! successful connect re-subscribes to all of them, so a broker restart
//! never silently drops the relay's subscription.
//!
//! One reconnect cycle makes at most `max_attempts` connect attempts and
//! sleeps `backoff_ms` between consecutive failures (never after the last).

use log::{error, info, warn};

use crate::app::events::NodeEvent;
use crate::app::ports::{BusMessage, BusPort, EventSink, TimePort};
use crate::config::TimingConfig;
use crate::error::{Error, Result};

pub struct BusClient<B> {
    bus: B,
    client_id: String,
    broker_url: String,
    subscriptions: Vec<String>,
    max_attempts: u32,
    backoff_ms: u32,
}

impl<B: BusPort> BusClient<B> {
    pub fn new(bus: B, client_id: String, broker_url: String, timing: &TimingConfig) -> Self {
        Self {
            bus,
            client_id,
            broker_url,
            subscriptions: Vec::new(),
            max_attempts: timing.bus_max_attempts.max(1),
            backoff_ms: timing.bus_backoff_ms,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_connected(&self) -> bool {
        self.bus.is_connected()
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Register a topic.  Subscribed immediately if a session is up and
    /// again after every reconnect.
    pub fn subscribe(&mut self, topic: &str) {
        if !self.subscriptions.iter().any(|t| t == topic) {
            self.subscriptions.push(topic.into());
        }
        if self.bus.is_connected() {
            if let Err(e) = self.bus.subscribe(topic) {
                warn!("MQTT: subscribe to '{}' failed: {}", topic, e);
            }
        }
    }

    /// One reconnect cycle.  Returns the attempt number that succeeded.
    pub fn reconnect_bounded(
        &mut self,
        time: &mut impl TimePort,
        sink: &mut impl EventSink,
    ) -> Result<u32> {
        for attempt in 1..=self.max_attempts {
            info!(
                "MQTT: connecting to {} as '{}' (attempt {}/{})",
                self.broker_url, self.client_id, attempt, self.max_attempts
            );
            match self.bus.connect(&self.client_id) {
                Ok(()) => {
                    self.resubscribe();
                    info!(
                        "MQTT: connected as '{}', topics {:?}",
                        self.client_id, self.subscriptions
                    );
                    sink.emit(&NodeEvent::BusConnected {
                        client_id: self.client_id.clone(),
                        attempt,
                    });
                    return Ok(attempt);
                }
                Err(e) => {
                    warn!("MQTT: {}", e);
                    if attempt < self.max_attempts {
                        time.sleep_ms(self.backoff_ms);
                    }
                }
            }
        }

        error!(
            "MQTT: broker {} unreachable after {} attempts",
            self.broker_url, self.max_attempts
        );
        let err = Error::BusUnreachable {
            attempts: self.max_attempts,
        };
        sink.emit(&NodeEvent::BusUnreachable {
            attempts: self.max_attempts,
        });
        Err(err)
    }

    /// Called every tick.  Reconnect failures are logged and absorbed.
    pub fn ensure_connected(&mut self, time: &mut impl TimePort, sink: &mut impl EventSink) -> bool {
        if self.bus.is_connected() {
            return true;
        }
        self.reconnect_bounded(time, sink).is_ok()
    }

    /// Fire-and-forget publish.  A dropped session gets one synchronous
    /// reconnect cycle first.
    pub fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        time: &mut impl TimePort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        if !self.bus.is_connected() {
            self.reconnect_bounded(time, sink)?;
        }
        self.bus.publish(topic, payload).map_err(|e| {
            warn!("MQTT: publish to '{}' failed: {}", topic, e);
            Error::from(e)
        })
    }

    /// Deliver every queued inbound message to `handler`, in arrival order.
    pub fn poll(&mut self, mut handler: impl FnMut(&BusMessage)) -> usize {
        let mut delivered = 0;
        while let Some(msg) = self.bus.poll() {
            info!(
                "MQTT: message on [{}]: {}",
                msg.topic,
                msg.payload_text()
            );
            handler(&msg);
            delivered += 1;
        }
        delivered
    }

    fn resubscribe(&mut self) {
        for topic in &self.subscriptions {
            if let Err(e) = self.bus.subscribe(topic) {
                // The session stays usable for publishing.
                warn!("MQTT: subscribe to '{}' failed: {}", topic, e);
            }
        }
    }
}
