//! Inbound commands to the relay node.
//!
//! Bus payloads map onto a closed command set by exact byte match.  There
//! is no trimming, case folding or numeric parsing: `"1 "`, `"01"` and
//! `"true"` are all [`Command::Unknown`].

/// Commands the relay node understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Energise the relay (unlock).
    RelayOn,
    /// Release the relay (lock).
    RelayOff,
    /// Anything else; ignored with a warning.
    Unknown,
}

impl Command {
    pub fn parse(payload: &[u8]) -> Self {
        match payload {
            b"1" => Self::RelayOn,
            b"0" => Self::RelayOff,
            _ => Self::Unknown,
        }
    }
}
