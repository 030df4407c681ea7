//! Record contracts
//!
//! Traits a concrete record type implements to be stored by a manager.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Timestamp type assigned by the managers
pub type Timestamp = DateTime<Utc>;

/// Separator between the parent and child parts of a composite key
pub const KEY_SEPARATOR: char = ':';

/// Anything a manager can persist in a slot
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Slot width in bytes, including the status byte
    ///
    /// Must never change for an existing data file.
    const RECORD_SIZE: usize;
}

/// Records that carry creation/update timestamps
pub trait Timestamped {
    fn set_created_at(&mut self, at: Timestamp);

    fn set_updated_at(&mut self, at: Timestamp);
}

/// Record addressed by a manager-minted unique identifier
pub trait CollectionItem: Record + Timestamped {
    fn id(&self) -> Uuid;

    fn set_id(&mut self, id: Uuid);
}

/// Relationship record addressed by `parent:child`
///
/// The composite key comes from the item itself; the manager never assigns
/// identity to join items.
pub trait JoinItem: Record {
    fn parent_id(&self) -> String;

    fn child_id(&self) -> String;

    fn composite_key(&self) -> String {
        composite_key(&self.parent_id(), &self.child_id())
    }

    /// Timestamp capability, if this item type has one
    ///
    /// Types with timestamps return `Some(self)`; the default opts out and
    /// the manager skips timestamping.
    fn timestamps_mut(&mut self) -> Option<&mut dyn Timestamped> {
        None
    }
}

/// Join `parent` and `child` into a composite key
pub fn composite_key(parent: &str, child: &str) -> String {
    format!("{parent}{KEY_SEPARATOR}{child}")
}

/// Parent component of a composite key (text before the first separator)
pub fn parent_of(key: &str) -> &str {
    key.split_once(KEY_SEPARATOR)
        .map(|(parent, _)| parent)
        .unwrap_or(key)
}
