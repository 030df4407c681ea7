//! Configuration for slotstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// File extension appended to every data file name
pub const DATA_FILE_EXTENSION: &str = "db";

/// Default file name used by the identity manager (`data.db`)
pub const DEFAULT_FILE_NAME: &str = "data";

/// Main configuration for a manager instance
#[derive(Debug, Clone)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the data file, created on open if missing
    /// Internal structure:
    ///   {data_dir}/
    ///     └── {file_name}.db   (fixed-slot record file)
    pub data_dir: PathBuf,

    /// Data file name without extension
    pub file_name: String,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: whether to fsync after each mutation
    pub sync_strategy: SyncStrategy,

    /// Take an advisory exclusive lock on the data file while open
    pub lock_file: bool,
}

/// Sync strategy for slot writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Leave flushing to the OS page cache (fastest)
    OsBuffered,

    /// fsync after every write, update and tombstone (safest, slowest)
    EveryWrite,
}

/// Options the slotted file needs from the config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOptions {
    pub sync_strategy: SyncStrategy,
    pub lock_file: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            sync_strategy: SyncStrategy::OsBuffered,
            lock_file: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./slotstore_data"),
            file_name: DEFAULT_FILE_NAME.to_string(),
            sync_strategy: SyncStrategy::OsBuffered,
            lock_file: true,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Full path of the data file: `{data_dir}/{file_name}.db`
    pub fn data_file_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", self.file_name, DATA_FILE_EXTENSION))
    }

    /// Options forwarded to the slotted file
    pub fn file_options(&self) -> FileOptions {
        FileOptions {
            sync_strategy: self.sync_strategy,
            lock_file: self.lock_file,
        }
    }

    /// Reject file names that would escape `data_dir`
    pub fn validate(&self) -> Result<()> {
        if self.file_name.is_empty() {
            return Err(StoreError::Config("file name must not be empty".to_string()));
        }
        if self.file_name.contains(['/', '\\']) || self.file_name == "." || self.file_name == ".." {
            return Err(StoreError::Config(format!(
                "file name {:?} must not contain path components",
                self.file_name
            )));
        }
        Ok(())
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct ConfigBuilder {
    config: StoreConfig,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the data file name (without `.db`)
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.config.file_name = name.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Enable or disable the advisory file lock
    pub fn lock_file(mut self, lock: bool) -> Self {
        self.config.lock_file = lock;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
