//! Reader node: card scan → backend decision → MQTT publish.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Mfrc522Reader   WifiAdapter   MqttAdapter   HttpBackend │
//! │  (TagReader)     (Connectivity)(Bus)         (Backend)   │
//! │  ─────────────── Port Trait Boundary ─────────────────   │
//! │               ReaderNodeService (pure logic)             │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::config::Config as SpiConfig;
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriverConfig};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::info;
use mfrc522::comm::blocking::spi::SpiInterface;

use rfidgate::adapters::device_id;
use rfidgate::adapters::http::HttpBackend;
use rfidgate::adapters::log_sink::LogEventSink;
use rfidgate::adapters::mqtt::MqttAdapter;
use rfidgate::adapters::nvs::NvsAdapter;
use rfidgate::adapters::rfid::Mfrc522Reader;
use rfidgate::adapters::time::Esp32TimeAdapter;
use rfidgate::adapters::wifi::WifiAdapter;
use rfidgate::app::service::ReaderNodeService;
use rfidgate::{config, pins};

const BUNDLED_CONFIG: &str = include_str!("../../config/reader-node.json");

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  rfidgate reader node v{}         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 2. Config: NVS, else the bundled JSON ─────────────────
    let store = NvsAdapter::new(nvs_partition.clone()).map_err(|e| anyhow!("NVS: {}", e))?;
    let config = config::resolve(&store, BUNDLED_CONFIG).map_err(|e| anyhow!("{}", e))?;
    info!(
        "Config: {} network(s), broker {}, backend {}",
        config.networks.len(),
        config.broker.url(),
        config.backend.endpoint_url()
    );

    // ── 3. MFRC522 on VSPI ────────────────────────────────────
    // SAFETY: each GPIO number is claimed exactly once, here.
    let mut rfid_rst = PinDriver::output(unsafe { AnyOutputPin::new(pins::RFID_RST_GPIO) })?;
    rfid_rst.set_high()?;

    let spi = SpiDeviceDriver::new_single(
        peripherals.spi3,
        unsafe { AnyOutputPin::new(pins::SPI_SCK_GPIO) },
        unsafe { AnyOutputPin::new(pins::SPI_MOSI_GPIO) },
        Some(unsafe { AnyIOPin::new(pins::SPI_MISO_GPIO) }),
        Some(unsafe { AnyOutputPin::new(pins::RFID_SS_GPIO) }),
        &SpiDriverConfig::new(),
        &SpiConfig::new().baudrate(Hertz(pins::RFID_SPI_BAUD_HZ)),
    )?;
    let reader = Mfrc522Reader::new(SpiInterface::new(spi))?;

    // ── 4. Network adapters ───────────────────────────────────
    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs_partition))?,
        sysloop,
    )?;
    let client_id = device_id::client_id(&config.broker.client_id_prefix, &device_id::read_mac());
    info!("MQTT client id: {}", client_id);

    let bus = MqttAdapter::new(config.broker.url(), config.broker.connect_timeout_ms);
    let backend = HttpBackend::new(&config.backend.user_agent);

    // ── 5. Run ────────────────────────────────────────────────
    let mut service = ReaderNodeService::new(
        &config,
        WifiAdapter::new(wifi),
        bus,
        client_id,
        backend,
        reader,
    );
    let mut time = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();

    service.start(&mut time, &mut sink);
    info!("Place a card near the reader...");
    loop {
        service.tick(&mut time, &mut sink);
    }
}
