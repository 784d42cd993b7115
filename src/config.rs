//! Node configuration parameters
//!
//! Everything a node needs to know about its environment: the ordered Wi-Fi
//! candidate list, the broker, the HTTP backend and every retry / pulse
//! timing.  Values come from NVS when present, otherwise from the JSON file
//! compiled into the binary (`config/*.json`).

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{ConfigError, ConfigPort, ConnectivityError};

/// One Wi-Fi network the node may associate with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCredential {
    pub ssid: String,
    pub password: String,
}

impl NetworkCredential {
    pub fn new(ssid: &str, password: &str) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }
}

/// Message broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// Topic carrying access decisions from the reader to the relay.
    pub topic: String,
    /// Client ids are `<prefix>_<XXYYZZ>` (last three MAC bytes).
    pub client_id_prefix: String,
    /// How long one connect attempt waits for the broker's CONNACK.
    pub connect_timeout_ms: u32,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.7".into(),
            port: 1883,
            topic: "RFID_LOGIN".into(),
            client_id_prefix: "ESP32_Node".into(),
            connect_timeout_ms: 5_000,
        }
    }
}

impl BrokerConfig {
    pub fn url(&self) -> String {
        format!("mqtt://{}:{}", self.host, self.port)
    }
}

/// HTTP backend the reader node reports tags to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub host: String,
    pub path: String,
    pub user_agent: String,
    pub timeout_ms: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.7".into(),
            path: "/it414_final_pit/rfid_handler.php".into(),
            user_agent: "ESP32-RFID-Client".into(),
            timeout_ms: 10_000,
        }
    }
}

impl BackendConfig {
    pub fn endpoint_url(&self) -> String {
        format!("http://{}{}", self.host, self.path)
    }
}

/// Retry budgets and loop pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Connect attempts per `reconnect_bounded` call.
    pub bus_max_attempts: u32,
    /// Sleep between failed bus connect attempts.
    pub bus_backoff_ms: u32,
    /// Wall-clock budget for a Wi-Fi reconnect inside the main loop.
    pub wifi_reconnect_budget_ms: u32,
    /// Poll interval of the unbounded boot-time association.
    pub wifi_connect_poll_ms: u32,
    /// Sleep between association rounds while reconnecting.
    pub wifi_retry_interval_ms: u32,
    /// Quiet period after every tag read.
    pub tag_cooldown_ms: u32,
    /// Loop sleep on the reader when no tag is present.
    pub reader_idle_ms: u32,
    /// Loop sleep on the relay node.
    pub relay_idle_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            bus_max_attempts: 5,
            bus_backoff_ms: 2_000,
            wifi_reconnect_budget_ms: 10_000,
            wifi_connect_poll_ms: 1_000,
            wifi_retry_interval_ms: 500,
            tag_cooldown_ms: 2_000,
            reader_idle_ms: 100,
            relay_idle_ms: 10,
        }
    }
}

/// Relay contact-pulse shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Make/break cycles before settling on the target level.
    pub pulse_cycles: u8,
    pub pulse_interval_ms: u32,
    /// Hold time at the target level before reading the pin back.
    pub settle_ms: u32,
    /// Hold time after driving the pin to OFF at boot.
    pub init_hold_ms: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            pulse_cycles: 3,
            pulse_interval_ms: 30,
            settle_ms: 50,
            init_hold_ms: 100,
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Candidate networks, tried in order.
    pub networks: Vec<NetworkCredential>,
    pub broker: BrokerConfig,
    pub backend: BackendConfig,
    pub timing: TimingConfig,
    pub relay: RelayConfig,
}

impl NodeConfig {
    /// Parse and validate a JSON document.  Missing sections take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.networks.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "networks must list at least one credential",
            ));
        }
        for cred in &self.networks {
            validate_ssid(&cred.ssid)
                .map_err(|_| ConfigError::ValidationFailed("ssid must be 1-32 bytes without control characters"))?;
            validate_password(&cred.password).map_err(|_| {
                ConfigError::ValidationFailed("password must be empty or 8-64 bytes")
            })?;
        }

        if self.broker.host.is_empty() {
            return Err(ConfigError::ValidationFailed("broker.host must not be empty"));
        }
        if self.broker.port == 0 {
            return Err(ConfigError::ValidationFailed("broker.port must be non-zero"));
        }
        if self.broker.topic.is_empty() || self.broker.topic.contains(['#', '+']) {
            return Err(ConfigError::ValidationFailed(
                "broker.topic must be a non-empty topic name without wildcards",
            ));
        }
        if self.broker.client_id_prefix.is_empty() || self.broker.client_id_prefix.len() > 16 {
            return Err(ConfigError::ValidationFailed(
                "broker.client_id_prefix must be 1-16 bytes",
            ));
        }
        if !(500..=30_000).contains(&self.broker.connect_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "broker.connect_timeout_ms must be 500-30000",
            ));
        }

        if self.backend.host.is_empty() || !self.backend.path.starts_with('/') {
            return Err(ConfigError::ValidationFailed(
                "backend needs a host and an absolute path",
            ));
        }
        if !(1_000..=60_000).contains(&self.backend.timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "backend.timeout_ms must be 1000-60000",
            ));
        }

        let t = &self.timing;
        if !(1..=20).contains(&t.bus_max_attempts) {
            return Err(ConfigError::ValidationFailed("timing.bus_max_attempts must be 1-20"));
        }
        if t.bus_backoff_ms == 0
            || t.wifi_reconnect_budget_ms == 0
            || t.wifi_connect_poll_ms == 0
            || t.wifi_retry_interval_ms == 0
        {
            return Err(ConfigError::ValidationFailed(
                "timing intervals and budgets must be non-zero",
            ));
        }

        if !(1..=10).contains(&self.relay.pulse_cycles) {
            return Err(ConfigError::ValidationFailed("relay.pulse_cycles must be 1-10"));
        }
        if !(5..=500).contains(&self.relay.pulse_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "relay.pulse_interval_ms must be 5-500",
            ));
        }
        Ok(())
    }
}

/// Boot-time config selection: the stored config if it loads and
/// validates, otherwise `bundled` (which is then persisted for next boot).
pub fn resolve(store: &impl ConfigPort, bundled: &str) -> crate::error::Result<NodeConfig> {
    match store.load() {
        Ok(cfg) => return Ok(cfg),
        Err(ConfigError::NotFound) => info!("Config: nothing stored, using bundled defaults"),
        Err(e) => warn!("Config: stored config unusable ({}), using bundled defaults", e),
    }
    let cfg = NodeConfig::from_json(bundled)?;
    if let Err(e) = store.save(&cfg) {
        warn!("Config: could not persist bundled config: {}", e);
    }
    Ok(cfg)
}

// ───────────────────────────────────────────────────────────────
// Credential validation
// ───────────────────────────────────────────────────────────────

/// SSID: 1-32 bytes of UTF-8, no control characters.
pub fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || ssid.chars().any(char::is_control) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

/// Password: empty (open network) or 8-64 bytes for WPA2.
pub fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}
