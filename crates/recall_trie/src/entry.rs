//! Lookup handles returned by [`KeyedCache::entry`](crate::KeyedCache::entry).
//!
//! A handle owns a reference to the deepest node the lookup reached, not a
//! borrow of the trie, so it stays valid while other lookups and inserts run.

use crate::node::NodeRef;
use crate::purge::{PurgeSchedule, purge_tree};
use recall_core::KeyPart;
use std::rc::Rc;

/// Result of a cache lookup
pub enum Entry<V> {
    /// A value is stored under the full key
    Occupied(OccupiedEntry<V>),
    /// Nothing is stored yet
    Vacant(VacantEntry<V>),
}

impl<V: Clone> Entry<V> {
    /// Stored value, if any
    #[must_use]
    pub fn value(&self) -> Option<V> {
        match self {
            Self::Occupied(entry) => Some(entry.value()),
            Self::Vacant(_) => None,
        }
    }

    /// Whether a value is stored
    #[must_use]
    pub const fn exists(&self) -> bool {
        matches!(self, Self::Occupied(_))
    }

    /// Full key sequence of this lookup
    #[must_use]
    pub fn key(&self) -> &[KeyPart] {
        match self {
            Self::Occupied(entry) => &entry.key,
            Self::Vacant(entry) => &entry.key,
        }
    }

    /// Store `value`, creating or overwriting
    pub fn set(self, value: V) -> V {
        match self {
            Self::Occupied(entry) => entry.set(value),
            Self::Vacant(entry) => entry.set(value),
        }
    }

    /// Existing value, or the result of `create` stored in a vacant slot
    pub fn or_insert_with(self, create: impl FnOnce(&[KeyPart]) -> V) -> V {
        match self {
            Self::Occupied(entry) => entry.value(),
            Self::Vacant(entry) => {
                let value = create(&entry.key);
                entry.set(value)
            }
        }
    }
}

/// Handle to a stored value
pub struct OccupiedEntry<V> {
    node: NodeRef<V>,
    key: Vec<KeyPart>,
    value: V,
}

impl<V: Clone> OccupiedEntry<V> {
    pub(crate) fn new(node: NodeRef<V>, key: Vec<KeyPart>, value: V) -> Self {
        Self { node, key, value }
    }

    /// The value stored at lookup time
    #[must_use]
    pub fn value(&self) -> V {
        self.value.clone()
    }

    /// Overwrite the stored value in place
    pub fn set(self, value: V) -> V {
        self.node.borrow_mut().value = Some(value.clone());
        value
    }
}

/// Handle to a location where a value may be stored once
pub struct VacantEntry<V> {
    node: NodeRef<V>,
    key: Vec<KeyPart>,
    unresolved: usize,
    root: NodeRef<V>,
    schedule: Rc<PurgeSchedule>,
}

impl<V: Clone> VacantEntry<V> {
    pub(crate) fn new(
        node: NodeRef<V>,
        key: Vec<KeyPart>,
        unresolved: usize,
        root: NodeRef<V>,
        schedule: Rc<PurgeSchedule>,
    ) -> Self {
        Self {
            node,
            key,
            unresolved,
            root,
            schedule,
        }
    }

    /// Number of leading key parts that had no node at lookup time
    #[must_use]
    pub const fn unresolved(&self) -> usize {
        self.unresolved
    }

    /// Build the missing chain of nodes and store `value` at its end.
    ///
    /// Creating edges may trigger a purge of the whole cache.
    pub fn set(self, value: V) -> V {
        let mut node = self.node;
        let mut created = 0;
        for part in self.key[..self.unresolved].iter().rev() {
            let (next, fresh) = node.borrow_mut().find_or_create_child(part);
            created += usize::from(fresh);
            node = next;
        }
        node.borrow_mut().value = Some(value.clone());
        drop(node);
        if self.schedule.record_inserts(created) {
            purge_tree(&self.root, &self.schedule);
        }
        value
    }
}
