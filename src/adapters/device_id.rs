//! Device identity derived from the ESP32 factory MAC address.
//!
//! Broker client ids take the form `<prefix>_XXYYZZ` (last 3 bytes of the
//! 6-byte MAC in uppercase hex), e.g. `ESP32_RFID_EFCAFE`.  The id is:
//! - Deterministic across reboots (factory-burned eFuse MAC)
//! - Unique per board, so two nodes never kick each other off the broker

use core::fmt::Write;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: `mac` is a valid 6-byte buffer.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Stable broker client id for this board.
pub fn client_id(prefix: &str, mac: &MacAddress) -> String {
    let mut id = String::with_capacity(prefix.len() + 7);
    let _ = write!(id, "{}_{:02X}{:02X}{:02X}", prefix, mac[3], mac[4], mac[5]);
    id
}
