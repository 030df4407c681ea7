//! Join Manager
//!
//! CRUD over relationship records addressed by `parent:child` keys.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::cache::RecordCache;
use crate::codec::{JsonCodec, PayloadCodec};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::item::{JoinItem, KEY_SEPARATOR};
use crate::storage::SlottedFile;

use super::parent_index::ParentIndex;

/// Cache-backed store of relationship records
///
/// Same locking discipline as
/// [`CollectionManager`](crate::collection::CollectionManager): one RwLock
/// over cache, parent index and file; mutations write the slot before
/// touching either in-memory map.
pub struct JoinManager<T: JoinItem, C: PayloadCodec = JsonCodec> {
    /// Configuration the manager was opened with
    config: StoreConfig,

    /// Data file path, kept for diagnostics after close
    path: PathBuf,

    /// Caches + file, `None` once closed
    state: RwLock<Option<JoinState<T>>>,

    _codec: PhantomData<fn() -> C>,
}

struct JoinState<T> {
    file: SlottedFile,
    cache: RecordCache<String, T>,
    parents: ParentIndex<T>,
}

impl<T: JoinItem> JoinManager<T> {
    /// Open or create `{dir}/{name}.db` with the default configuration
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let config = StoreConfig::builder()
            .data_dir(dir.as_ref())
            .file_name(name)
            .build();
        Self::open_with_config(config)
    }
}

impl<T: JoinItem, C: PayloadCodec> JoinManager<T, C> {
    /// Open or create the data file described by `config`
    ///
    /// The parent index is rebuilt from the loaded cache in slot order, so
    /// children appear in the order they were appended.
    pub fn open_with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let path = config.data_file_path();
        let file = SlottedFile::open(&path, T::RECORD_SIZE, config.file_options())?;
        let cache = RecordCache::load::<C, _>(&file, |item: &T| item.composite_key())?;
        let parents = ParentIndex::from_entries(cache.by_offset());

        debug!(parents = parents.len(), "parent index rebuilt");

        Ok(Self {
            config,
            path,
            state: RwLock::new(Some(JoinState {
                file,
                cache,
                parents,
            })),
            _codec: PhantomData,
        })
    }

    /// Store a new relationship, stamping timestamps if the item has them
    ///
    /// Fails with `AlreadyExists` if the composite key is taken.
    pub fn create(&self, mut item: T) -> Result<T> {
        if let Some(stamps) = item.timestamps_mut() {
            let now = Utc::now();
            stamps.set_created_at(now);
            stamps.set_updated_at(now);
        }
        self.insert_new(item)
    }

    /// Store `item` exactly as given, timestamps included
    ///
    /// Used to copy a relationship whose identity is already embedded in the
    /// item. Duplicate keys are rejected as in [`create`](Self::create).
    pub fn clone_item(&self, item: T) -> Result<T> {
        self.insert_new(item)
    }

    /// Cached item under `key`
    pub fn read(&self, key: &str) -> Result<T> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(StoreError::Closed)?;

        state
            .cache
            .get(key)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| StoreError::NotFound(format!("item with key {key}")))
    }

    /// Snapshot of every item, in unspecified order
    pub fn read_all(&self) -> Result<Vec<T>> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(state.cache.values())
    }

    /// Rewrite an existing relationship in place
    pub fn update(&self, mut item: T) -> Result<T> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(StoreError::Closed)?;

        let key = item.composite_key();
        let offset = state
            .cache
            .get(key.as_str())
            .map(|entry| entry.offset)
            .ok_or_else(|| StoreError::NotFound(format!("item with key {key}")))?;

        if let Some(stamps) = item.timestamps_mut() {
            stamps.set_updated_at(Utc::now());
        }

        let payload = C::encode(&item)?;
        state.file.update_record(offset, &payload)?;
        state.cache.replace(key.as_str(), item.clone());
        state.parents.replace(&key, item.clone());

        debug!(key = %key, offset, "relationship updated");
        Ok(item)
    }

    /// Tombstone the relationship and drop it from both maps
    pub fn delete(&self, key: &str) -> Result<()> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(StoreError::Closed)?;

        let offset = state
            .cache
            .get(key)
            .map(|entry| entry.offset)
            .ok_or_else(|| StoreError::NotFound(format!("item with key {key}")))?;

        state.file.delete_record(offset)?;
        state.cache.remove(key);
        state.parents.remove(key);

        debug!(key = %key, offset, "relationship deleted");
        Ok(())
    }

    /// Every current child of `parent_id`
    ///
    /// Fails with `ParentNotFound` when the parent has no children.
    pub fn get_by_parent_id(&self, parent_id: &str) -> Result<Vec<T>> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(StoreError::Closed)?;

        state
            .parents
            .children(parent_id)
            .map(<[T]>::to_vec)
            .ok_or_else(|| StoreError::ParentNotFound(parent_id.to_string()))
    }

    /// Number of cached relationships
    pub fn count(&self) -> Result<usize> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(state.cache.len())
    }

    /// Number of parents with at least one child
    pub fn parent_count(&self) -> Result<usize> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(state.parents.len())
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(state.cache.contains(key))
    }

    /// Discard both maps and close the data file
    pub fn close(&self) -> Result<()> {
        let mut guard = self.state.write();
        if let Some(state) = guard.take() {
            let items = state.cache.len();
            state.file.close()?;
            info!(path = %self.path.display(), items, "join collection closed");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.state.read().is_none()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_size(&self) -> usize {
        T::RECORD_SIZE
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Append a relationship that must not exist yet
    fn insert_new(&self, item: T) -> Result<T> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(StoreError::Closed)?;

        let key = item.composite_key();
        validate_key(&key)?;
        if state.cache.contains(key.as_str()) {
            return Err(StoreError::AlreadyExists(key));
        }

        let payload = C::encode(&item)?;
        let offset = state.file.write_record(&payload)?;
        state.cache.insert(key.clone(), item.clone(), offset);
        state.parents.insert(&key, item.clone());

        debug!(key = %key, offset, "relationship created");
        Ok(item)
    }
}

/// A composite key needs a non-empty parent and child around the separator
fn validate_key(key: &str) -> Result<()> {
    match key.split_once(KEY_SEPARATOR) {
        Some((parent, child)) if !parent.is_empty() && !child.is_empty() => Ok(()),
        _ => Err(StoreError::InvalidKey(format!(
            "{key:?} is not of the form parent{KEY_SEPARATOR}child"
        ))),
    }
}
