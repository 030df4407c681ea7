//! Collection Manager
//!
//! CRUD over records addressed by a manager-minted UUID v7.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::RecordCache;
use crate::codec::{JsonCodec, PayloadCodec};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::item::CollectionItem;
use crate::storage::SlottedFile;

/// Cache-backed store of identity records
///
/// ## Concurrency Model
///
/// - One RwLock guards the cache and the file handle together
/// - `create`/`update`/`delete`/`close` hold it exclusively for the whole
///   cache + file mutation; the slotted file's own lock nests inside
/// - `read`/`read_all`/`count` share it and never touch the file
///
/// Every mutation writes the slot first and updates the cache only after
/// the write succeeded, so a failed write leaves the cache unchanged.
pub struct CollectionManager<T: CollectionItem, C: PayloadCodec = JsonCodec> {
    /// Configuration the manager was opened with
    config: StoreConfig,

    /// Data file path, kept for diagnostics after close
    path: PathBuf,

    /// Cache + file, `None` once closed
    state: RwLock<Option<CollectionState<T>>>,

    _codec: PhantomData<fn() -> C>,
}

struct CollectionState<T> {
    file: SlottedFile,
    cache: RecordCache<Uuid, T>,
}

impl<T: CollectionItem> CollectionManager<T> {
    /// Open or create `{dir}/data.db` with the default configuration
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let config = StoreConfig::builder().data_dir(dir.as_ref()).build();
        Self::open_with_config(config)
    }
}

impl<T: CollectionItem, C: PayloadCodec> CollectionManager<T, C> {
    /// Open or create the data file described by `config`
    ///
    /// On startup:
    /// 1. Create the data directory if missing
    /// 2. Open the slotted file sized to `T::RECORD_SIZE`
    /// 3. Rebuild the cache from every readable slot
    pub fn open_with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let path = config.data_file_path();
        let file = SlottedFile::open(&path, T::RECORD_SIZE, config.file_options())?;
        let cache = RecordCache::load::<C, _>(&file, |item: &T| item.id())?;

        Ok(Self {
            config,
            path,
            state: RwLock::new(Some(CollectionState { file, cache })),
            _codec: PhantomData,
        })
    }

    /// Store a new item, assigning its id and timestamps
    ///
    /// Any id already set on `item` is replaced.
    pub fn create(&self, mut item: T) -> Result<T> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(StoreError::Closed)?;

        let id = mint_id(&state.cache);
        let now = Utc::now();
        item.set_id(id);
        item.set_created_at(now);
        item.set_updated_at(now);

        let payload = C::encode(&item)?;
        let offset = state.file.write_record(&payload)?;
        state.cache.insert(id, item.clone(), offset);

        debug!(id = %id, offset, "item created");
        Ok(item)
    }

    /// Cached item with `id`
    pub fn read(&self, id: Uuid) -> Result<T> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(StoreError::Closed)?;

        state
            .cache
            .get(&id)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| StoreError::NotFound(format!("item with ID {id}")))
    }

    /// Snapshot of every item, in unspecified order
    pub fn read_all(&self) -> Result<Vec<T>> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(state.cache.values())
    }

    /// Rewrite an existing item in place, refreshing its update timestamp
    pub fn update(&self, mut item: T) -> Result<T> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(StoreError::Closed)?;

        let id = item.id();
        let offset = state
            .cache
            .get(&id)
            .map(|entry| entry.offset)
            .ok_or_else(|| StoreError::NotFound(format!("item with ID {id}")))?;

        item.set_updated_at(Utc::now());

        let payload = C::encode(&item)?;
        state.file.update_record(offset, &payload)?;
        state.cache.replace(&id, item.clone());

        debug!(id = %id, offset, "item updated");
        Ok(item)
    }

    /// Tombstone the item's slot and drop it from the cache
    pub fn delete(&self, id: Uuid) -> Result<()> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(StoreError::Closed)?;

        let offset = state
            .cache
            .get(&id)
            .map(|entry| entry.offset)
            .ok_or_else(|| StoreError::NotFound(format!("item with ID {id}")))?;

        state.file.delete_record(offset)?;
        state.cache.remove(&id);

        debug!(id = %id, offset, "item deleted");
        Ok(())
    }

    /// Number of cached items
    pub fn count(&self) -> Result<usize> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(state.cache.len())
    }

    pub fn contains(&self, id: Uuid) -> Result<bool> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(state.cache.contains(&id))
    }

    /// Discard the cache and close the data file
    ///
    /// Every later call fails with `StoreError::Closed`; closing again is a
    /// no-op.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.state.write();
        if let Some(state) = guard.take() {
            let items = state.cache.len();
            state.file.close()?;
            info!(path = %self.path.display(), items, "collection closed");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.state.read().is_none()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Path of the backing data file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Slot width used for the backing file
    pub fn record_size(&self) -> usize {
        T::RECORD_SIZE
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

/// Mint a UUID v7 that is not already cached
fn mint_id<T>(cache: &RecordCache<Uuid, T>) -> Uuid
where
    T: CollectionItem,
{
    loop {
        let id = Uuid::now_v7();
        if !cache.contains(&id) {
            return id;
        }
    }
}
