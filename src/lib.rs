//! # slotstore
//!
//! A persistent, cache-backed record store with:
//! - Fixed-slot binary data files with in-place updates
//! - Tombstone deletion (slots are never reclaimed)
//! - An authoritative in-memory cache rebuilt on open
//! - Identity records keyed by UUID v7 and relationship records keyed by
//!   `parent:child` with a parent index
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────┐      ┌──────────────────────────┐
//! │  CollectionManager<T>    │      │     JoinManager<T>       │
//! │  (UUID v7 keys)          │      │  (parent:child keys)     │
//! └────────────┬─────────────┘      └────────────┬─────────────┘
//!              │                                 │
//!              ▼                                 ▼
//!       ┌─────────────┐              ┌─────────────┬─────────────┐
//!       │ RecordCache │              │ RecordCache │ ParentIndex │
//!       │  (RwLock)   │              │          (RwLock)         │
//!       └──────┬──────┘              └──────────────┬────────────┘
//!              │                                    │
//!              ▼                                    ▼
//!       ┌─────────────┐                     ┌─────────────┐
//!       │ SlottedFile │                     │ SlottedFile │
//!       │  data.db    │                     │  {name}.db  │
//!       └─────────────┘                     └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use chrono::{DateTime, Utc};
//! use serde::{Deserialize, Serialize};
//! use slotstore::{CollectionItem, CollectionManager, Record, Timestamped};
//! use uuid::Uuid;
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Chat {
//!     id: Uuid,
//!     title: String,
//!     created_at: Option<DateTime<Utc>>,
//!     updated_at: Option<DateTime<Utc>>,
//! }
//!
//! impl Record for Chat {
//!     const RECORD_SIZE: usize = 512;
//! }
//!
//! impl Timestamped for Chat {
//!     fn set_created_at(&mut self, at: DateTime<Utc>) { self.created_at = Some(at); }
//!     fn set_updated_at(&mut self, at: DateTime<Utc>) { self.updated_at = Some(at); }
//! }
//!
//! impl CollectionItem for Chat {
//!     fn id(&self) -> Uuid { self.id }
//!     fn set_id(&mut self, id: Uuid) { self.id = id; }
//! }
//!
//! # fn main() -> slotstore::Result<()> {
//! let chats = CollectionManager::<Chat>::open("./chats")?;
//! let chat = chats.create(Chat { title: "general".into(), ..Default::default() })?;
//! assert_eq!(chats.read(chat.id)?.title, "general");
//! chats.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod codec;
pub mod item;

pub mod storage;
mod cache;
pub mod collection;
pub mod join;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::{StoreConfig, SyncStrategy};
pub use codec::{JsonCodec, PayloadCodec};
pub use item::{CollectionItem, JoinItem, Record, Timestamp, Timestamped};
pub use storage::{SlottedFile, SlotStatus};
pub use collection::CollectionManager;
pub use join::JoinManager;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of slotstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
