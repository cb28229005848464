//! Purge reporting for reclaiming unreachable cache entries.

use crate::node::NodeRef;
use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// Outcome of a full purge pass over a [`KeyedCache`](crate::KeyedCache)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    /// Identity edges whose key was no longer reachable
    pub dead_edges: usize,
    /// Stored values dropped along with those edges
    pub reclaimed_values: usize,
    /// Nodes removed because they held neither a value nor children
    pub empty_nodes: usize,
}

impl PurgeReport {
    /// Create an empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the purge removed nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dead_edges == 0 && self.empty_nodes == 0
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: PurgeReport) {
        self.dead_edges += other.dead_edges;
        self.reclaimed_values += other.reclaimed_values;
        self.empty_nodes += other.empty_nodes;
    }
}

/// Decides when edge insertions have earned a full purge.
///
/// A purge costs time proportional to the number of edges, so it runs once
/// the edges created since the last one reach the edge count that purge
/// left behind (and at least `min_inserts`). Dead entries can therefore
/// never outnumber live ones by more than that margin.
#[derive(Debug)]
pub(crate) struct PurgeSchedule {
    min_inserts: usize,
    inserted: Cell<usize>,
    purge_at: Cell<usize>,
}

impl PurgeSchedule {
    pub(crate) fn new(min_inserts: usize) -> Self {
        let min_inserts = min_inserts.max(1);
        Self {
            min_inserts,
            inserted: Cell::new(0),
            purge_at: Cell::new(min_inserts),
        }
    }

    /// Count `created` new edges; true once a purge is due.
    pub(crate) fn record_inserts(&self, created: usize) -> bool {
        let inserted = self.inserted.get() + created;
        self.inserted.set(inserted);
        inserted >= self.purge_at.get()
    }

    /// Restart counting after a purge that left `edges` edges.
    pub(crate) fn restart(&self, edges: usize) {
        self.inserted.set(0);
        self.purge_at.set(self.min_inserts.max(edges));
    }

    pub(crate) fn purge_at(&self) -> usize {
        self.purge_at.get()
    }
}

/// Purge the trie under `root` and restart `schedule`.
pub(crate) fn purge_tree<V>(root: &NodeRef<V>, schedule: &PurgeSchedule) -> PurgeReport {
    let mut report = PurgeReport::new();
    let edges = {
        let mut node = root.borrow_mut();
        node.purge(&mut report);
        node.edge_count()
    };
    schedule.restart(edges);
    tracing::trace!(
        dead_edges = report.dead_edges,
        reclaimed_values = report.reclaimed_values,
        empty_nodes = report.empty_nodes,
        edges,
        next = schedule.purge_at(),
        "purged keyed cache"
    );
    report
}
