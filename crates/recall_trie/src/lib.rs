//! Recall Keyed Cache
//!
//! A trie mapping variable-length key sequences to stored values. Value key
//! parts are held strongly; identity key parts are held weakly, so an entry
//! becomes unreachable as soon as any object in its key does. Unreachable
//! entries are dropped by a purge of the whole trie, which runs
//! automatically once enough edges have been inserted since the last one,
//! and on demand through [`KeyedCache::purge`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
mod node;
pub mod purge;

pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use purge::PurgeReport;

use node::{Node, NodeRef};
use purge::{PurgeSchedule, purge_tree};
use recall_core::{KeyPart, RecallConfig};
use std::rc::Rc;

/// Weak-aware trie from key sequences to values.
///
/// Key sequences are walked from the last part to the first, so the parts
/// that vary most (trailing arguments) fan out near the root and the leading
/// function identity sits just above the stored value.
///
/// Stored values are held strongly. A value that itself owns a strong
/// reference to one of its identity key parts keeps that part, and so the
/// entry, alive.
pub struct KeyedCache<V> {
    root: NodeRef<V>,
    schedule: Rc<PurgeSchedule>,
}

impl<V: Clone> KeyedCache<V> {
    /// Create an empty cache with the default purge threshold
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&RecallConfig::default())
    }

    /// Create an empty cache using the purge threshold from `config`
    #[must_use]
    pub fn with_config(config: &RecallConfig) -> Self {
        Self {
            root: Node::new_ref(),
            schedule: Rc::new(PurgeSchedule::new(config.sweep_min_len)),
        }
    }

    /// Look up `key`. Never fails and never creates nodes.
    pub fn entry(&self, key: &[KeyPart]) -> Entry<V> {
        let mut node = Rc::clone(&self.root);
        for (i, part) in key.iter().enumerate().rev() {
            let next = node.borrow().child(part);
            match next {
                Some(next) => node = next,
                None => return Entry::Vacant(self.vacant(node, key, i + 1)),
            }
        }

        let stored = node.borrow().value.clone();
        match stored {
            Some(value) => Entry::Occupied(OccupiedEntry::new(node, key.to_vec(), value)),
            None => Entry::Vacant(self.vacant(node, key, 0)),
        }
    }

    fn vacant(&self, node: NodeRef<V>, key: &[KeyPart], unresolved: usize) -> VacantEntry<V> {
        VacantEntry::new(
            node,
            key.to_vec(),
            unresolved,
            Rc::clone(&self.root),
            Rc::clone(&self.schedule),
        )
    }

    /// Stored value for `key`, if any
    #[must_use]
    pub fn get(&self, key: &[KeyPart]) -> Option<V> {
        self.entry(key).value()
    }

    /// Store `value` under `key`, creating or overwriting
    pub fn insert(&self, key: &[KeyPart], value: V) -> V {
        self.entry(key).set(value)
    }

    /// Number of values reachable through live edges
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.borrow().live_len()
    }

    /// Check if no value is reachable
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every dead identity edge, with everything stored below it, and
    /// every empty node no entry handle points at.
    pub fn purge(&self) -> PurgeReport {
        purge_tree(&self.root, &self.schedule)
    }
}

impl<V: Clone> Default for KeyedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
