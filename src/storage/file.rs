//! Slotted File
//!
//! Fixed-size record file with in-place updates and tombstone deletes.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::RwLock;
use tracing::{trace, warn};

use crate::config::{FileOptions, SyncStrategy};
use crate::error::{Result, StoreError};

use super::scan::SlotScan;
use super::slot::{self, SlotStatus, STATUS_SIZE};

/// Fixed-slot record file
///
/// ## Concurrency:
/// - `file`: Protected by RwLock; reads share it, writes/updates/deletes
///   hold it exclusively
/// - Reads and writes are positional, so shared readers never race on a
///   file cursor
/// - `None` once closed; every operation then fails with `Closed`
///
/// Offsets are caller supplied. The file keeps no record of which offsets
/// hold live records; that belongs to the manager layer.
pub struct SlottedFile {
    /// Path of the data file
    path: PathBuf,

    /// Width of every slot in bytes (status byte + payload capacity)
    record_size: usize,

    /// fsync policy for mutations
    sync_strategy: SyncStrategy,

    /// Open file handle
    file: RwLock<Option<File>>,
}

impl SlottedFile {
    /// Open or create the slotted file at `path`
    ///
    /// Parent directories are created if missing. `record_size` must stay
    /// the same for the life of the file since all offset math depends on it.
    pub fn open(path: &Path, record_size: usize, options: FileOptions) -> Result<Self> {
        if record_size <= STATUS_SIZE {
            return Err(StoreError::Config(format!(
                "record size must be larger than {} byte, got {}",
                STATUS_SIZE, record_size
            )));
        }

        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        if options.lock_file {
            file.try_lock_exclusive()
                .map_err(|e| lock_error(path, e))?;
        }

        let len = file.metadata()?.len();
        let torn = len % record_size as u64;
        if torn != 0 {
            warn!(
                path = %path.display(),
                len,
                torn_bytes = torn,
                "data file ends with a partial slot; next append starts after it"
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            record_size,
            sync_strategy: options.sync_strategy,
            file: RwLock::new(Some(file)),
        })
    }

    /// Append a new active slot, returning its offset
    pub fn write_record(&self, payload: &[u8]) -> Result<u64> {
        let buf = slot::encode(self.record_size, payload)?;

        let guard = self.file.write();
        let file = guard.as_ref().ok_or(StoreError::Closed)?;

        // A torn tail keeps its slot; the gap up to the next boundary reads as zeros
        let len = file.metadata()?.len();
        let offset = len.div_ceil(self.record_size as u64) * self.record_size as u64;

        write_all_at(file, &buf, offset)?;
        self.maybe_sync(file)?;

        trace!(offset, len = payload.len(), "slot appended");
        Ok(offset)
    }

    /// Read the payload stored at `offset`
    pub fn read_record(&self, offset: u64) -> Result<Vec<u8>> {
        self.check_offset(offset)?;

        let guard = self.file.read();
        let file = guard.as_ref().ok_or(StoreError::Closed)?;

        let mut buf = vec![0u8; self.record_size];
        let n = read_full_at(file, &mut buf, offset)?;
        if n == 0 {
            return Err(StoreError::NoData { offset });
        }

        slot::decode(offset, &buf[..n]).map(<[u8]>::to_vec)
    }

    /// Overwrite the slot at `offset` with a new active payload
    pub fn update_record(&self, offset: u64, payload: &[u8]) -> Result<()> {
        self.check_offset(offset)?;
        let buf = slot::encode(self.record_size, payload)?;

        let guard = self.file.write();
        let file = guard.as_ref().ok_or(StoreError::Closed)?;

        write_all_at(file, &buf, offset)?;
        self.maybe_sync(file)?;

        trace!(offset, len = payload.len(), "slot rewritten");
        Ok(())
    }

    /// Mark the slot at `offset` deleted, leaving its payload bytes untouched
    pub fn delete_record(&self, offset: u64) -> Result<()> {
        self.check_offset(offset)?;

        let guard = self.file.write();
        let file = guard.as_ref().ok_or(StoreError::Closed)?;

        write_all_at(file, &[SlotStatus::Deleted.as_byte()], offset)?;
        self.maybe_sync(file)?;

        trace!(offset, "slot tombstoned");
        Ok(())
    }

    /// Status byte of the slot at `offset`
    pub fn slot_status(&self, offset: u64) -> Result<SlotStatus> {
        self.check_offset(offset)?;

        let guard = self.file.read();
        let file = guard.as_ref().ok_or(StoreError::Closed)?;

        let mut status = [0u8; STATUS_SIZE];
        if read_full_at(file, &mut status, offset)? == 0 {
            return Err(StoreError::NoData { offset });
        }

        SlotStatus::from_byte(status[0]).ok_or_else(|| {
            StoreError::Corruption(format!(
                "unknown status byte {:#04x} at offset {}",
                status[0], offset
            ))
        })
    }

    /// Current file length in bytes
    pub fn len(&self) -> Result<u64> {
        let guard = self.file.read();
        let file = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(file.metadata()?.len())
    }

    /// True when the file holds no bytes
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of slots, counting a torn trailing slot
    pub fn slot_count(&self) -> Result<u64> {
        Ok(self.len()?.div_ceil(self.record_size as u64))
    }

    /// Iterate every slot from offset 0 in `record_size` strides
    pub fn scan(&self) -> Result<SlotScan<'_>> {
        let len = self.len()?;
        Ok(SlotScan::new(self, len))
    }

    /// Flush and release the file handle
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.file.write();
        if let Some(file) = guard.take() {
            file.sync_all()?;
            // Dropping the handle releases the advisory lock
            drop(file);
            trace!(path = %self.path.display(), "slotted file closed");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.file.read().is_none()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Payload bytes available per slot
    pub fn capacity(&self) -> usize {
        slot::capacity(self.record_size)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn check_offset(&self, offset: u64) -> Result<()> {
        if offset % self.record_size as u64 != 0 {
            return Err(StoreError::InvalidOffset {
                offset,
                record_size: self.record_size,
            });
        }
        Ok(())
    }

    fn maybe_sync(&self, file: &File) -> Result<()> {
        if self.sync_strategy == SyncStrategy::EveryWrite {
            file.sync_data()?;
        }
        Ok(())
    }
}

// =============================================================================
// Positional I/O
// =============================================================================

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    std::os::unix::fs::FileExt::read_at(file, buf, offset)
}

#[cfg(unix)]
fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    std::os::unix::fs::FileExt::write_at(file, buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_read(file, buf, offset)
}

#[cfg(windows)]
fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_write(file, buf, offset)
}

/// Read until `buf` is full or EOF, returning the byte count
fn read_full_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match read_at(file, &mut buf[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn write_all_at(file: &File, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
    while !buf.is_empty() {
        match write_at(file, buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole slot",
                ))
            }
            Ok(n) => {
                buf = &buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Only a contended lock means another owner; anything else is plain I/O
fn lock_error(path: &Path, e: io::Error) -> StoreError {
    if e.raw_os_error().is_some() && e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
    {
        StoreError::Locked(path.to_path_buf())
    } else {
        StoreError::Io(e)
    }
}
