//! ESP32 time adapter.
//!
//! Implements [`TimePort`] for both node loops.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic) and
//!   sleeps through `FreeRtos::delay_ms`, yielding to the MQTT and Wi-Fi
//!   tasks.
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` and
//!   `std::thread::sleep` for host-side runs.

use crate::app::ports::TimePort;

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: reads the free-running high-resolution timer.
        let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        u64::try_from(us).unwrap_or(0)
    }

    /// Microseconds since start (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

impl TimePort for Esp32TimeAdapter {
    fn now_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }

    #[cfg(target_os = "espidf")]
    fn sleep_ms(&mut self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn sleep_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
