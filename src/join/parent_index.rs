//! Parent index
//!
//! Secondary map from parent id to the join items under it.

use std::collections::HashMap;

use crate::item::{parent_of, JoinItem};

/// Parent id → children, in insertion (or load discovery) order
pub(crate) struct ParentIndex<T> {
    parents: HashMap<String, Vec<T>>,
}

impl<T: JoinItem> ParentIndex<T> {
    pub fn new() -> Self {
        Self {
            parents: HashMap::new(),
        }
    }

    /// Build the index from `(key, item)` pairs in discovery order
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a String, &'a T)>) -> Self {
        let mut index = Self::new();
        for (key, item) in entries {
            index.insert(key, item.clone());
        }
        index
    }

    /// Append `item` under the parent component of `key`
    pub fn insert(&mut self, key: &str, item: T) {
        self.parents
            .entry(parent_of(key).to_string())
            .or_default()
            .push(item);
    }

    /// Swap in a new value for the child stored under `key`
    pub fn replace(&mut self, key: &str, item: T) {
        if let Some(children) = self.parents.get_mut(parent_of(key)) {
            if let Some(slot) = children.iter_mut().find(|c| c.composite_key() == key) {
                *slot = item;
            }
        }
    }

    /// Remove the child stored under `key`; siblings stay in place
    ///
    /// A parent left with no children is dropped from the index.
    pub fn remove(&mut self, key: &str) -> bool {
        let parent = parent_of(key);
        let Some(children) = self.parents.get_mut(parent) else {
            return false;
        };

        let removed = match children.iter().position(|c| c.composite_key() == key) {
            Some(pos) => {
                children.remove(pos);
                true
            }
            None => false,
        };

        if children.is_empty() {
            self.parents.remove(parent);
        }
        removed
    }

    /// Current children of `parent`, if it has any
    pub fn children(&self, parent: &str) -> Option<&[T]> {
        self.parents
            .get(parent)
            .map(Vec::as_slice)
            .filter(|children| !children.is_empty())
    }

    /// Number of parents with at least one child
    pub fn len(&self) -> usize {
        self.parents.len()
    }
}
