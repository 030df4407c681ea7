//! Slot Scan
//!
//! Walks a slotted file from offset 0 in `record_size` strides.

use crate::error::Result;

use super::SlottedFile;

/// Iterator over every slot of a [`SlottedFile`]
///
/// Yields `(offset, payload)` pairs. A slot that cannot be read (tombstone,
/// empty, corrupt) yields its error instead of ending the scan, so callers
/// decide whether to skip it.
///
/// The end of the scan is fixed at creation time; slots appended afterwards
/// are not visited.
pub struct SlotScan<'a> {
    file: &'a SlottedFile,
    offset: u64,
    end: u64,
}

impl<'a> SlotScan<'a> {
    pub(super) fn new(file: &'a SlottedFile, end: u64) -> Self {
        Self {
            file,
            offset: 0,
            end,
        }
    }
}

impl Iterator for SlotScan<'_> {
    type Item = (u64, Result<Vec<u8>>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.end {
            return None;
        }

        let offset = self.offset;
        self.offset += self.file.record_size() as u64;

        Some((offset, self.file.read_record(offset)))
    }
}
