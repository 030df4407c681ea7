//! Record cache
//!
//! In-memory mirror of every active slot, keyed by record key.
//!
//! Each entry also remembers the byte offset of its slot, so updates and
//! deletes go straight to the right slot without rescanning the file. Value
//! and offset live in the same map entry and cannot drift apart.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use tracing::{debug, info, warn};

use crate::codec::PayloadCodec;
use crate::error::{Result, StoreError};
use crate::item::Record;
use crate::storage::SlottedFile;

/// A cached record and the offset of the slot holding it
#[derive(Debug, Clone)]
pub(crate) struct CachedRecord<T> {
    pub value: T,
    pub offset: u64,
}

/// Authoritative read path once a manager is open
pub(crate) struct RecordCache<K, T> {
    entries: HashMap<K, CachedRecord<T>>,
}

impl<K, T> RecordCache<K, T>
where
    K: Eq + Hash + Clone + Display,
    T: Record,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Rebuild the cache from every readable slot of `file`
    ///
    /// Tombstoned, empty, corrupt or undecodable slots are logged and
    /// skipped. When two slots decode to the same key the later one wins and
    /// the earlier slot is tombstoned, so a later delete cannot resurrect it.
    pub fn load<C, F>(file: &SlottedFile, key_of: F) -> Result<Self>
    where
        C: PayloadCodec,
        F: Fn(&T) -> K,
    {
        let mut cache = Self::new();
        let mut tombstones = 0u64;
        let mut skipped = 0u64;
        let mut superseded = 0u64;

        for (offset, read) in file.scan()? {
            let payload = match read {
                Ok(payload) => payload,
                Err(StoreError::RecordDeleted { .. }) => {
                    tombstones += 1;
                    continue;
                }
                Err(e) => {
                    warn!(offset, error = %e, "skipping unreadable slot");
                    skipped += 1;
                    continue;
                }
            };

            let value: T = match C::decode(&payload) {
                Ok(value) => value,
                Err(e) => {
                    warn!(offset, error = %e, "skipping undecodable slot");
                    skipped += 1;
                    continue;
                }
            };

            let key = key_of(&value);
            if let Some(previous) = cache.insert(key.clone(), value, offset) {
                warn!(
                    key = %key,
                    previous_offset = previous.offset,
                    offset,
                    "duplicate key on load; later slot wins, tombstoning earlier slot"
                );
                file.delete_record(previous.offset)?;
                superseded += 1;
            }
        }

        debug!(tombstones, "tombstoned slots skipped");
        info!(
            path = %file.path().display(),
            loaded = cache.len(),
            skipped,
            superseded,
            "loaded items into cache"
        );

        Ok(cache)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&CachedRecord<T>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Insert a record at `offset`, returning any entry it displaced
    pub fn insert(&mut self, key: K, value: T, offset: u64) -> Option<CachedRecord<T>> {
        self.entries.insert(key, CachedRecord { value, offset })
    }

    /// Replace the value of an existing entry, keeping its offset
    pub fn replace<Q>(&mut self, key: &Q, value: T)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.value = value;
        }
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<CachedRecord<T>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key)
    }

    /// Snapshot of every cached value, in unspecified order
    pub fn values(&self) -> Vec<T> {
        self.entries.values().map(|e| e.value.clone()).collect()
    }

    /// Entries ordered by slot offset, i.e. the order they were appended
    pub fn by_offset(&self) -> Vec<(&K, &T)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(k, e)| (e.offset, k, &e.value))
            .collect();
        entries.sort_by_key(|(offset, _, _)| *offset);
        entries.into_iter().map(|(_, k, v)| (k, v)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
