//! Card reader adapter.
//!
//! Implements [`TagReaderPort`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: MFRC522 over SPI via the `mfrc522` crate
//!   (REQA → anticollision/select → UID).
//! - **all other targets**: [`SimTagReader`], a scripted queue of cards.

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

#[cfg(not(target_os = "espidf"))]
use crate::app::ports::TagReaderPort;
#[cfg(not(target_os = "espidf"))]
use crate::app::tag::TagIdentifier;

// ───────────────────────────────────────────────────────────────
// MFRC522
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use self::mfrc::Mfrc522Reader;

#[cfg(target_os = "espidf")]
mod mfrc {
    use log::{info, warn};
    use mfrc522::comm::Interface;
    use mfrc522::{Initialized, Mfrc522};

    use crate::app::ports::TagReaderPort;
    use crate::app::tag::TagIdentifier;

    pub struct Mfrc522Reader<COMM: Interface> {
        chip: Mfrc522<COMM, Initialized>,
    }

    impl<COMM: Interface> Mfrc522Reader<COMM> {
        /// Soft-reset and configure the chip.  Fails if it does not answer.
        pub fn new(comm: COMM) -> anyhow::Result<Self> {
            let mut chip = Mfrc522::new(comm)
                .init()
                .map_err(|_| anyhow::anyhow!("MFRC522 did not answer on SPI"))?;
            match chip.version() {
                Ok(v) => info!("RFID: MFRC522 ready, version 0x{:02X}", v),
                Err(_) => warn!("RFID: MFRC522 version register unreadable"),
            }
            Ok(Self { chip })
        }
    }

    impl<COMM: Interface> TagReaderPort for Mfrc522Reader<COMM> {
        fn poll_tag(&mut self) -> Option<TagIdentifier> {
            let atqa = self.chip.reqa().ok()?;
            let uid = match self.chip.select(&atqa) {
                Ok(uid) => uid,
                Err(_) => {
                    warn!("RFID: card answered REQA but select failed");
                    return None;
                }
            };
            let tag = TagIdentifier::from_bytes(uid.as_bytes());
            if tag.is_none() {
                warn!("RFID: unsupported UID length {}", uid.as_bytes().len());
            }
            tag
        }

        fn halt(&mut self) {
            let _ = self.chip.hlta();
            let _ = self.chip.stop_crypto1();
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

/// Cards are "presented" by queueing their UIDs; each poll consumes one.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimTagReader {
    queue: VecDeque<TagIdentifier>,
    halts: u32,
}

#[cfg(not(target_os = "espidf"))]
impl SimTagReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a card.  UIDs the chip could not report are ignored.
    pub fn present(&mut self, uid: &[u8]) {
        if let Some(tag) = TagIdentifier::from_bytes(uid) {
            self.queue.push_back(tag);
        }
    }

    pub fn halts(&self) -> u32 {
        self.halts
    }
}

#[cfg(not(target_os = "espidf"))]
impl TagReaderPort for SimTagReader {
    fn poll_tag(&mut self) -> Option<TagIdentifier> {
        self.queue.pop_front()
    }

    fn halt(&mut self) {
        self.halts += 1;
    }
}
