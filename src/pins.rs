//! GPIO / peripheral pin assignments for both node boards (ESP32 DevKit).
//!
//! Single source of truth; the binaries reference this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Relay node
// ---------------------------------------------------------------------------

/// Lock relay control, active LOW (LOW = energised / unlocked).
pub const RELAY_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// Reader node (MFRC522 on VSPI)
// ---------------------------------------------------------------------------

/// SPI chip select (SDA on the module silkscreen).
pub const RFID_SS_GPIO: i32 = 21;
/// Reader hard reset, active LOW.
pub const RFID_RST_GPIO: i32 = 22;

pub const SPI_SCK_GPIO: i32 = 18;
pub const SPI_MISO_GPIO: i32 = 19;
pub const SPI_MOSI_GPIO: i32 = 23;

/// MFRC522 accepts up to 10 MHz; 4 MHz keeps breadboard wiring reliable.
pub const RFID_SPI_BAUD_HZ: u32 = 4_000_000;
