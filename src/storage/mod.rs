//! Storage Module
//!
//! Persistent storage layer using a fixed-slot file format.
//!
//! ## Responsibilities
//! - Append records into fixed-width slots
//! - Positional reads and in-place rewrites keyed by byte offset
//! - Tombstone deletes (space is never reclaimed)
//! - Enforce that every payload fits its slot
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Slot 0  (offset 0)                     │
//! │ ┌──────────┬─────────────┬───────────┐ │
//! │ │Status (1)│   Payload   │ 0x00 pad  │ │
//! │ └──────────┴─────────────┴───────────┘ │
//! ├────────────────────────────────────────┤
//! │ Slot 1  (offset record_size)           │
//! │ ┌──────────┬─────────────┬───────────┐ │
//! │ │Status (1)│   Payload   │ 0x00 pad  │ │
//! │ └──────────┴─────────────┴───────────┘ │
//! │ ... (repeated, append order)           │
//! └────────────────────────────────────────┘
//!
//! Status: 0x00 = active, 0x01 = deleted
//! ```
//!
//! The payload ends at its first zero byte, so payloads containing a zero
//! byte are rejected on write.

mod file;
mod scan;
pub mod slot;

pub use file::SlottedFile;
pub use scan::SlotScan;
pub use slot::SlotStatus;
