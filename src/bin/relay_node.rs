//! Relay node: MQTT command → lock relay pulse.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  WifiAdapter      MqttAdapter      PinDriver + FreeRtos  │
//! │  (Connectivity)   (Bus)            (relay GPIO, delay)   │
//! │  ─────────────── Port Trait Boundary ─────────────────   │
//! │               RelayNodeService (pure logic)              │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::info;

use rfidgate::adapters::device_id;
use rfidgate::adapters::log_sink::LogEventSink;
use rfidgate::adapters::mqtt::MqttAdapter;
use rfidgate::adapters::nvs::NvsAdapter;
use rfidgate::adapters::time::Esp32TimeAdapter;
use rfidgate::adapters::wifi::WifiAdapter;
use rfidgate::app::service::RelayNodeService;
use rfidgate::{config, pins};

const BUNDLED_CONFIG: &str = include_str!("../../config/relay-node.json");

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    // Relay released before anything else; the pin powers up LOW.
    // SAFETY: the relay GPIO is claimed exactly once, here.
    let mut relay_pin = PinDriver::output(unsafe { AnyOutputPin::new(pins::RELAY_GPIO) })?;
    relay_pin.set_high()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  rfidgate relay node v{}          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 2. Config: NVS, else the bundled JSON ─────────────────
    let store = NvsAdapter::new(nvs_partition.clone()).map_err(|e| anyhow!("NVS: {}", e))?;
    let config = config::resolve(&store, BUNDLED_CONFIG).map_err(|e| anyhow!("{}", e))?;
    info!(
        "Config: {} network(s), broker {}, topic '{}'",
        config.networks.len(),
        config.broker.url(),
        config.broker.topic
    );

    // ── 3. Network adapters ───────────────────────────────────
    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs_partition))?,
        sysloop,
    )?;
    let client_id = device_id::client_id(&config.broker.client_id_prefix, &device_id::read_mac());
    info!("MQTT client id: {}", client_id);

    let bus = MqttAdapter::new(config.broker.url(), config.broker.connect_timeout_ms);

    // ── 4. Run ────────────────────────────────────────────────
    let mut service = RelayNodeService::new(
        &config,
        WifiAdapter::new(wifi),
        bus,
        client_id,
        relay_pin,
        FreeRtos,
    );
    let mut time = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();

    service.start(&mut time, &mut sink);
    loop {
        service.tick(&mut time, &mut sink);
    }
}
