//! Lock relay driver (CW-020 style module, low-level trigger).
//!
//! The coil is energised while the control pin is LOW; HIGH releases it.
//! A single level change occasionally leaves the contacts stuck, so every
//! switch runs a make/break pulse train before settling:
//!
//! ```text
//! pulse_on:  H─┐  ┌─┐  ┌─┐  ┌──────   (3 × 30 ms high / 30 ms low,
//!              └──┘ └──┘ └──┘ LOW     then LOW held 50 ms)
//! ```
//!
//! A full switch takes `cycles × 2 × interval + settle` (230 ms with the
//! defaults) and blocks the caller throughout.
//!
//! ## Dual-target design
//!
//! Generic over embedded-hal 1.0 pins and delays: `PinDriver` + `FreeRtos`
//! on ESP-IDF, recording mocks on the host.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::StatefulOutputPin;
use log::{info, warn};

use crate::config::RelayConfig;
use crate::error::ActuatorError;

/// Steady state of the relay contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayLevel {
    /// Coil powered, pin LOW.
    Energized,
    /// Coil off, pin HIGH.
    Released,
}

impl RelayLevel {
    fn opposite(self) -> Self {
        match self {
            Self::Energized => Self::Released,
            Self::Released => Self::Energized,
        }
    }

    pub fn pin_label(self) -> &'static str {
        match self {
            Self::Energized => "LOW",
            Self::Released => "HIGH",
        }
    }
}

pub struct RelayActuator<P, D> {
    pin: P,
    delay: D,
    cfg: RelayConfig,
}

impl<P, D> RelayActuator<P, D>
where
    P: StatefulOutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D, cfg: RelayConfig) -> Self {
        Self { pin, delay, cfg }
    }

    /// Drive the pin to the released level and hold it before anything
    /// else runs, so the lock stays shut through boot.
    pub fn init(&mut self) -> Result<RelayLevel, ActuatorError> {
        self.drive(RelayLevel::Released)?;
        self.delay.delay_ms(self.cfg.init_hold_ms);
        let level = self.level()?;
        info!("Relay: initialised, state {:?} ({})", level, level.pin_label());
        Ok(level)
    }

    /// Pulse the contacts and leave the relay energised.
    pub fn pulse_on(&mut self) -> Result<RelayLevel, ActuatorError> {
        info!("Relay: pulsing contacts to ensure engagement");
        self.pulse(RelayLevel::Energized)
    }

    /// Pulse the contacts and leave the relay released.
    pub fn pulse_off(&mut self) -> Result<RelayLevel, ActuatorError> {
        info!("Relay: pulsing contacts to disengage");
        self.pulse(RelayLevel::Released)
    }

    /// Read the commanded pin level back.
    pub fn level(&mut self) -> Result<RelayLevel, ActuatorError> {
        let low = self
            .pin
            .is_set_low()
            .map_err(|_| ActuatorError::GpioReadFailed)?;
        Ok(if low {
            RelayLevel::Energized
        } else {
            RelayLevel::Released
        })
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    /// Hand the pin and delay back (used by tests to inspect mocks).
    pub fn into_parts(self) -> (P, D) {
        (self.pin, self.delay)
    }

    fn pulse(&mut self, target: RelayLevel) -> Result<RelayLevel, ActuatorError> {
        let away = target.opposite();
        for _ in 0..self.cfg.pulse_cycles {
            self.drive(away)?;
            self.delay.delay_ms(self.cfg.pulse_interval_ms);
            self.drive(target)?;
            self.delay.delay_ms(self.cfg.pulse_interval_ms);
        }

        self.drive(target)?;
        self.delay.delay_ms(self.cfg.settle_ms);

        let level = self.level()?;
        if level == target {
            info!("Relay: GPIO state {} ({:?})", level.pin_label(), level);
        } else {
            warn!(
                "Relay: GPIO state {} but {} was commanded",
                level.pin_label(),
                target.pin_label()
            );
        }
        Ok(level)
    }

    fn drive(&mut self, level: RelayLevel) -> Result<(), ActuatorError> {
        let written = match level {
            RelayLevel::Energized => self.pin.set_low(),
            RelayLevel::Released => self.pin.set_high(),
        };
        written.map_err(|_| ActuatorError::GpioWriteFailed)
    }
}
