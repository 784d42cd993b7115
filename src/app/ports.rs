//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Node services (domain)
//! ```
//!
//! Driven adapters (Wi-Fi, MQTT, HTTP, RFID, clock, NVS, event sinks)
//! implement these traits.  The bootstrapper, bus client, reporter and node
//! services consume them via generics, so the domain never touches an
//! ESP-IDF handle directly and every retry path runs against fakes on the
//! host.

use core::fmt;

use crate::app::tag::TagIdentifier;
use crate::config::{NetworkCredential, NodeConfig};

// ───────────────────────────────────────────────────────────────
// Connectivity port (Wi-Fi station)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    AssociationFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 bytes without control characters)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::AssociationFailed => write!(f, "WiFi association failed"),
        }
    }
}

/// What the station is attached to, reported after association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    pub ssid: String,
    pub ip: [u8; 4],
    pub rssi: Option<i8>,
}

impl fmt::Display for LinkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.ip;
        write!(f, "'{}' ip={}.{}.{}.{}", self.ssid, a, b, c, d)?;
        match self.rssi {
            Some(rssi) => write!(f, " rssi={}dBm", rssi),
            None => Ok(()),
        }
    }
}

pub trait ConnectivityPort {
    /// Try to associate with one network.  Blocks for at most one driver
    /// connect attempt.
    fn associate(&mut self, credential: &NetworkCredential) -> Result<(), ConnectivityError>;

    /// Live link status as reported by the driver.
    fn is_connected(&self) -> bool;

    /// Details of the current link, `None` while disconnected.
    fn link_info(&self) -> Option<LinkInfo>;
}

// ───────────────────────────────────────────────────────────────
// Bus port (MQTT client)
// ───────────────────────────────────────────────────────────────

/// One inbound bus message.  Lives only for the duration of delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(topic: &str, payload: &[u8]) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.to_vec(),
        }
    }

    /// Payload rendered for logs (lossy UTF-8).
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Broker refused or never acknowledged the session.  `rc` follows the
    /// MQTT CONNACK / client-state convention (negative = transport).
    ConnectFailed { rc: i32 },
    NotConnected,
    SubscribeFailed,
    PublishFailed,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed { rc } => write!(f, "broker connect failed, rc={}", rc),
            Self::NotConnected => write!(f, "not connected to broker"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
            Self::PublishFailed => write!(f, "publish failed"),
        }
    }
}

pub trait BusPort {
    /// Open a session with the given client id, replacing any previous one.
    fn connect(&mut self, client_id: &str) -> Result<(), BusError>;

    fn is_connected(&self) -> bool;

    fn subscribe(&mut self, topic: &str) -> Result<(), BusError>;

    /// Fire-and-forget publish (QoS 0, not retained).
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BusError>;

    /// Next message received since the last call, if any.
    fn poll(&mut self) -> Option<BusMessage>;
}

// ───────────────────────────────────────────────────────────────
// Backend port (HTTP client)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    /// No response within the request timeout.
    Timeout,
    /// Connection or transport failure with the driver's error code.
    Transport(i32),
    /// The server answered with a non-2xx status.
    Status(u16),
    /// Response body exceeded the read buffer.
    BodyTooLarge,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::Transport(code) => write!(f, "transport error, code: {}", code),
            Self::Status(status) => write!(f, "HTTP status {}", status),
            Self::BodyTooLarge => write!(f, "response body too large"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait BackendPort {
    /// One synchronous `POST` with a JSON body.  No retries.
    fn post_json(&mut self, url: &str, body: &[u8], timeout_ms: u32) -> Result<HttpResponse, HttpError>;
}

// ───────────────────────────────────────────────────────────────
// Tag reader port (MFRC522)
// ───────────────────────────────────────────────────────────────

pub trait TagReaderPort {
    /// A newly presented card's UID, or `None` if no card answered.
    fn poll_tag(&mut self) -> Option<TagIdentifier>;

    /// Put the current card to sleep and end any crypto session.
    fn halt(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic clock plus blocking sleep.  Every retry loop sleeps through
/// this port so tests can run budgets without wall-clock time.
pub trait TimePort {
    fn now_ms(&self) -> u64;
    fn sleep_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging)
// ───────────────────────────────────────────────────────────────

/// The node services emit structured [`NodeEvent`](super::events::NodeEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::NodeEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (NVS)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the node configuration.
///
/// Implementations MUST validate before persisting; invalid values are
/// rejected with [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    /// Load the stored configuration; [`ConfigError::NotFound`] on first boot.
    fn load(&self) -> Result<NodeConfig, ConfigError>;

    /// Validate and persist.
    fn save(&self, config: &NodeConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
