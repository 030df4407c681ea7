//! Error types for slotstore
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for slotstore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data file {0} is locked by another owner")]
    Locked(PathBuf),

    // -------------------------------------------------------------------------
    // Slot Errors
    // -------------------------------------------------------------------------
    #[error("Payload of {size} bytes is larger than max record size ({capacity} bytes)")]
    PayloadTooLarge { size: usize, capacity: usize },

    #[error("Payload is empty")]
    EmptyPayload,

    #[error("Payload contains a zero byte at position {position}")]
    EmbeddedTerminator { position: usize },

    #[error("Invalid offset {offset} for record size {record_size}")]
    InvalidOffset { offset: u64, record_size: usize },

    #[error("No data read at offset {offset}")]
    NoData { offset: u64 },

    #[error("Record at offset {offset} is marked as deleted")]
    RecordDeleted { offset: u64 },

    #[error("Empty data at offset {offset}")]
    EmptySlot { offset: u64 },

    #[error("Corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Manager Errors
    // -------------------------------------------------------------------------
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("No items found for parent ID: {0}")]
    ParentNotFound(String),

    #[error("Item with key {0} already exists")]
    AlreadyExists(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Manager is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// True for lookups that referenced an id, key or parent with no record
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::ParentNotFound(_))
    }

    /// True when a payload did not fit its slot
    pub fn is_capacity(&self) -> bool {
        matches!(self, StoreError::PayloadTooLarge { .. })
    }
}
