//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements       | Connects to                     |
//! |-------------|------------------|---------------------------------|
//! | `wifi`      | ConnectivityPort | ESP-IDF WiFi STA                |
//! | `mqtt`      | BusPort          | ESP-MQTT client (QoS 0)         |
//! | `http`      | BackendPort      | ESP-IDF HTTP client             |
//! | `rfid`      | TagReaderPort    | MFRC522 over SPI                |
//! | `time`      | TimePort         | ESP32 system timer, FreeRTOS    |
//! | `nvs`       | ConfigPort       | NVS / in-memory store           |
//! | `log_sink`  | EventSink        | Serial log output               |
//! | `device_id` | —                | eFuse MAC → broker client id    |
//!
//! Every adapter has a host simulation backend selected by
//! `cfg(not(target_os = "espidf"))`.

pub mod device_id;
pub mod http;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod rfid;
pub mod time;
pub mod wifi;
