//! Unified error types for the rfidgate firmware.
//!
//! One `Copy` enum that every subsystem converts into, so the main loop can
//! log any failure the same way.  Nothing here is ever escalated past a
//! node service: each variant is logged and absorbed where it occurs.

use core::fmt;

use crate::app::ports::{BusError, ConfigError, ConnectivityError, HttpError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Wi-Fi is down; the operation needing it was skipped.
    NetworkUnavailable,
    /// The broker could not be reached within the retry budget.
    BusUnreachable { attempts: u32 },
    /// A bus operation failed on an established session.
    Bus(BusError),
    /// The backend request failed or returned a non-2xx status.
    HttpFailure(HttpError),
    /// The backend answered with a body that is not JSON.
    MalformedResponse,
    /// A bus payload that is not a known command.
    UnknownCommand,
    /// The relay pin could not be driven or read back.
    Actuator(ActuatorError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkUnavailable => write!(f, "no WiFi connection"),
            Self::BusUnreachable { attempts } => {
                write!(f, "broker unreachable after {} attempts", attempts)
            }
            Self::Bus(e) => write!(f, "MQTT: {}", e),
            Self::HttpFailure(e) => write!(f, "HTTP request failed: {}", e),
            Self::MalformedResponse => write!(f, "JSON parsing failed"),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::Actuator(e) => write!(f, "actuator: {}", e),
            Self::Config(msg) => write!(f, "config: {}", msg),
        }
    }
}

impl From<HttpError> for Error {
    fn from(e: HttpError) -> Self {
        Self::HttpFailure(e)
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(match e {
            ConfigError::NotFound => "not found",
            ConfigError::Corrupted => "not decodable",
            ConfigError::ValidationFailed(msg) => msg,
            ConfigError::IoError => "storage I/O error",
        })
    }
}

impl From<ConnectivityError> for Error {
    fn from(_: ConnectivityError) -> Self {
        Self::NetworkUnavailable
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
    /// GPIO read-back failed.
    GpioReadFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
