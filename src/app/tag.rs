//! Tag identifiers as read from the card reader.
//!
//! MIFARE UIDs are 4, 7 or 10 bytes.  The backend keys its registry on the
//! uppercase hex rendering with two digits per byte (`[0x0A, 0xFF]` →
//! `"0AFF"`), so that string is produced once and never altered.

use core::fmt::{self, Write};

/// Longest UID a triple-size card reports.
pub const MAX_UID_LEN: usize = 10;

/// Hex rendering of a UID (two characters per byte).
pub type TagHex = heapless::String<{ MAX_UID_LEN * 2 }>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagIdentifier {
    bytes: heapless::Vec<u8, MAX_UID_LEN>,
}

impl TagIdentifier {
    /// `None` for an empty UID or one longer than [`MAX_UID_LEN`].
    pub fn from_bytes(uid: &[u8]) -> Option<Self> {
        if uid.is_empty() {
            return None;
        }
        let bytes = heapless::Vec::from_slice(uid).ok()?;
        Some(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Uppercase, zero-padded hex.
    pub fn to_hex(&self) -> TagHex {
        let mut out = TagHex::new();
        for b in &self.bytes {
            // Capacity is exactly 2 * MAX_UID_LEN, so this cannot overflow.
            let _ = write!(out, "{:02X}", b);
        }
        out
    }
}

impl fmt::Display for TagIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
