//! MQTT bus adapter.
//!
//! Implements [`BusPort`] at QoS 0.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspMqttClient` in callback mode.  The
//!   client runs in its own ESP-IDF task; the callback only flips the
//!   connected flag and queues complete inbound messages.  The main loop
//!   drains the queue through [`BusPort::poll`], so dispatch stays on the
//!   loop thread.
//! - **all other targets**: an in-process loopback broker for host tests.

use std::collections::VecDeque;

use log::{info, warn};

use crate::app::ports::{BusError, BusMessage, BusPort};

/// Inbound messages held between two loop ticks; oldest dropped first.
const INBOX_CAPACITY: usize = 16;

fn enqueue(inbox: &mut VecDeque<BusMessage>, msg: BusMessage) {
    if inbox.len() >= INBOX_CAPACITY {
        if let Some(dropped) = inbox.pop_front() {
            warn!("MQTT: inbox full, dropping message on '{}'", dropped.topic);
        }
    }
    inbox.push_back(msg);
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use esp_idf_svc::mqtt::client::{
        Details, EspMqttClient, EventPayload, MqttClientConfiguration, QoS,
    };
    use log::{debug, info, warn};

    use super::enqueue;
    use crate::app::ports::{BusError, BusMessage};

    /// `PubSubClient`-style return codes for log output.
    const RC_CONNECTION_TIMEOUT: i32 = -4;
    const RC_CONNECT_FAILED: i32 = -2;

    const CONNECT_POLL: Duration = Duration::from_millis(50);

    pub struct MqttAdapter {
        url: String,
        connect_timeout: Duration,
        client: Option<EspMqttClient<'static>>,
        connected: Arc<AtomicBool>,
        inbox: Arc<Mutex<VecDeque<BusMessage>>>,
    }

    impl MqttAdapter {
        pub fn new(url: String, connect_timeout_ms: u32) -> Self {
            Self {
                url,
                connect_timeout: Duration::from_millis(u64::from(connect_timeout_ms)),
                client: None,
                connected: Arc::new(AtomicBool::new(false)),
                inbox: Arc::new(Mutex::new(VecDeque::new())),
            }
        }

        pub(super) fn platform_connect(&mut self, client_id: &str) -> Result<(), BusError> {
            // Tear down the previous session before opening a new one.
            self.client = None;
            self.connected.store(false, Ordering::SeqCst);

            let conf = MqttClientConfiguration {
                client_id: Some(client_id),
                ..Default::default()
            };

            let connected = self.connected.clone();
            let inbox = self.inbox.clone();
            let client = EspMqttClient::new_cb(&self.url, &conf, move |event| {
                match event.payload() {
                    EventPayload::Connected(_) => connected.store(true, Ordering::SeqCst),
                    EventPayload::Disconnected => connected.store(false, Ordering::SeqCst),
                    EventPayload::Received {
                        topic: Some(topic),
                        data,
                        details: Details::Complete,
                        ..
                    } => {
                        if let Ok(mut q) = inbox.lock() {
                            enqueue(&mut q, BusMessage::new(topic, data));
                        }
                    }
                    EventPayload::Received { .. } => {
                        debug!("MQTT(espidf): fragmented message ignored");
                    }
                    EventPayload::Error(e) => warn!("MQTT(espidf): client error: {:?}", e),
                    _ => {}
                }
            })
            .map_err(|e| {
                warn!("MQTT(espidf): client init failed: {}", e);
                BusError::ConnectFailed { rc: RC_CONNECT_FAILED }
            })?;
            self.client = Some(client);

            let started = Instant::now();
            while started.elapsed() < self.connect_timeout {
                if self.connected.load(Ordering::SeqCst) {
                    info!("MQTT(espidf): session up in {} ms", started.elapsed().as_millis());
                    return Ok(());
                }
                std::thread::sleep(CONNECT_POLL);
            }
            self.client = None;
            Err(BusError::ConnectFailed {
                rc: RC_CONNECTION_TIMEOUT,
            })
        }

        pub(super) fn platform_is_connected(&self) -> bool {
            self.client.is_some() && self.connected.load(Ordering::SeqCst)
        }

        pub(super) fn platform_subscribe(&mut self, topic: &str) -> Result<(), BusError> {
            let client = self.client.as_mut().ok_or(BusError::NotConnected)?;
            client
                .subscribe(topic, QoS::AtMostOnce)
                .map(|_| ())
                .map_err(|_| BusError::SubscribeFailed)
        }

        pub(super) fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BusError> {
            let client = self.client.as_mut().ok_or(BusError::NotConnected)?;
            client
                .publish(topic, QoS::AtMostOnce, false, payload)
                .map(|_| ())
                .map_err(|_| BusError::PublishFailed)
        }

        pub(super) fn platform_poll(&mut self) -> Option<BusMessage> {
            self.inbox.lock().ok()?.pop_front()
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host backend: loopback broker
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod platform {
    use std::collections::VecDeque;

    use super::enqueue;
    use crate::app::ports::{BusError, BusMessage};

    /// Return code reported while the simulated broker is down.
    const RC_CONNECT_FAILED: i32 = -2;

    pub struct MqttAdapter {
        broker_up: bool,
        session: Option<String>,
        subscriptions: Vec<String>,
        inbox: VecDeque<BusMessage>,
        published: Vec<BusMessage>,
    }

    impl MqttAdapter {
        pub fn loopback() -> Self {
            Self {
                broker_up: true,
                session: None,
                subscriptions: Vec::new(),
                inbox: VecDeque::new(),
                published: Vec::new(),
            }
        }

        /// Simulation: take the broker down (dropping the session) or back up.
        pub fn set_broker_up(&mut self, up: bool) {
            self.broker_up = up;
            if !up {
                self.session = None;
                self.subscriptions.clear();
            }
        }

        /// Simulation: deliver a message from another client.
        pub fn inject(&mut self, topic: &str, payload: &[u8]) {
            if self.session.is_some() && self.subscriptions.iter().any(|t| t == topic) {
                enqueue(&mut self.inbox, BusMessage::new(topic, payload));
            }
        }

        /// Everything this client has published.
        pub fn published(&self) -> &[BusMessage] {
            &self.published
        }

        pub fn session_id(&self) -> Option<&str> {
            self.session.as_deref()
        }

        pub(super) fn platform_connect(&mut self, client_id: &str) -> Result<(), BusError> {
            if !self.broker_up {
                return Err(BusError::ConnectFailed { rc: RC_CONNECT_FAILED });
            }
            self.session = Some(client_id.into());
            self.subscriptions.clear();
            Ok(())
        }

        pub(super) fn platform_is_connected(&self) -> bool {
            self.session.is_some()
        }

        pub(super) fn platform_subscribe(&mut self, topic: &str) -> Result<(), BusError> {
            if self.session.is_none() {
                return Err(BusError::NotConnected);
            }
            if !self.subscriptions.iter().any(|t| t == topic) {
                self.subscriptions.push(topic.into());
            }
            Ok(())
        }

        pub(super) fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BusError> {
            if self.session.is_none() {
                return Err(BusError::NotConnected);
            }
            self.published.push(BusMessage::new(topic, payload));
            self.inject(topic, payload);
            Ok(())
        }

        pub(super) fn platform_poll(&mut self) -> Option<BusMessage> {
            self.inbox.pop_front()
        }
    }
}

pub use platform::MqttAdapter;

// ───────────────────────────────────────────────────────────────
// BusPort
// ───────────────────────────────────────────────────────────────

impl BusPort for MqttAdapter {
    fn connect(&mut self, client_id: &str) -> Result<(), BusError> {
        self.platform_connect(client_id)?;
        info!("MQTT: session open as '{}'", client_id);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), BusError> {
        self.platform_subscribe(topic)?;
        info!("MQTT: subscribed to '{}'", topic);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BusError> {
        self.platform_publish(topic, payload)
    }

    fn poll(&mut self) -> Option<BusMessage> {
        self.platform_poll()
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn refuses_while_broker_down() {
        let mut m = MqttAdapter::loopback();
        m.set_broker_up(false);
        assert_eq!(m.connect("ESP32_RFID_000001"), Err(BusError::ConnectFailed { rc: -2 }));
        assert!(!m.is_connected());
    }

    #[test]
    fn subscribed_topic_loops_back() {
        let mut m = MqttAdapter::loopback();
        m.connect("ESP32_Relay_000001").unwrap();
        m.subscribe("RFID_LOGIN").unwrap();
        m.publish("RFID_LOGIN", b"1").unwrap();
        m.publish("OTHER", b"x").unwrap();
        assert_eq!(m.poll(), Some(BusMessage::new("RFID_LOGIN", b"1")));
        assert_eq!(m.poll(), None);
        assert_eq!(m.published().len(), 2);
    }

    #[test]
    fn reconnect_forgets_subscriptions() {
        let mut m = MqttAdapter::loopback();
        m.connect("a").unwrap();
        m.subscribe("RFID_LOGIN").unwrap();
        m.connect("a").unwrap();
        m.inject("RFID_LOGIN", b"0");
        assert_eq!(m.poll(), None);
    }

    #[test]
    fn inbox_drops_oldest_when_full() {
        let mut inbox = VecDeque::new();
        for i in 0..=INBOX_CAPACITY {
            enqueue(&mut inbox, BusMessage::new("t", i.to_string().as_bytes()));
        }
        assert_eq!(inbox.len(), INBOX_CAPACITY);
        assert_eq!(inbox.front().map(BusMessage::payload_text), Some("1".into()));
    }
}
