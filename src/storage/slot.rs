//! Slot encoding
//!
//! Builds and parses the fixed-width byte image of a single record.

use crate::error::{Result, StoreError};

/// Size of the status byte at the head of every slot
pub const STATUS_SIZE: usize = 1;

/// Byte that terminates the payload inside its slot
pub const TERMINATOR: u8 = 0x00;

/// Status byte of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SlotStatus {
    /// Live record
    Active = 0x00,

    /// Tombstone; the payload bytes are left in place
    Deleted = 0x01,
}

impl SlotStatus {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(SlotStatus::Active),
            0x01 => Some(SlotStatus::Deleted),
            _ => None,
        }
    }
}

/// Payload bytes available in a slot of `record_size` bytes
pub fn capacity(record_size: usize) -> usize {
    record_size.saturating_sub(STATUS_SIZE)
}

/// Check that `payload` can be stored and recovered intact
///
/// The payload length is recovered by locating the first zero byte, so an
/// embedded zero would silently shorten the record on read.
pub fn validate_payload(record_size: usize, payload: &[u8]) -> Result<()> {
    let capacity = capacity(record_size);
    if payload.len() > capacity {
        return Err(StoreError::PayloadTooLarge {
            size: payload.len(),
            capacity,
        });
    }
    if payload.is_empty() {
        return Err(StoreError::EmptyPayload);
    }
    if let Some(position) = payload.iter().position(|&b| b == TERMINATOR) {
        return Err(StoreError::EmbeddedTerminator { position });
    }
    Ok(())
}

/// Build the full slot image: `[status][payload][zero padding]`
pub fn encode(record_size: usize, payload: &[u8]) -> Result<Vec<u8>> {
    validate_payload(record_size, payload)?;

    let mut buf = vec![TERMINATOR; record_size];
    buf[0] = SlotStatus::Active.as_byte();
    buf[STATUS_SIZE..STATUS_SIZE + payload.len()].copy_from_slice(payload);
    Ok(buf)
}

/// Parse a slot image read at `offset`, returning the payload slice
///
/// `buf` may be shorter than a full slot when the file ends mid-slot; the
/// missing bytes behave like zero padding.
pub fn decode(offset: u64, buf: &[u8]) -> Result<&[u8]> {
    let status_byte = *buf.first().ok_or(StoreError::NoData { offset })?;

    match SlotStatus::from_byte(status_byte) {
        Some(SlotStatus::Active) => {}
        Some(SlotStatus::Deleted) => return Err(StoreError::RecordDeleted { offset }),
        None => {
            return Err(StoreError::Corruption(format!(
                "unknown status byte {:#04x} at offset {}",
                status_byte, offset
            )))
        }
    }

    let body = &buf[STATUS_SIZE..];
    let len = body
        .iter()
        .position(|&b| b == TERMINATOR)
        .unwrap_or(body.len());

    if len == 0 {
        return Err(StoreError::EmptySlot { offset });
    }

    Ok(&body[..len])
}
