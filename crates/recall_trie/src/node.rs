//! Trie nodes and their strong/weak edge maps.

use crate::purge::PurgeReport;
use indexmap::IndexMap;
use recall_core::{KeyPart, RefKey, ValueKey};
use std::cell::RefCell;
use std::rc::Rc;

pub(crate) type NodeRef<V> = Rc<RefCell<Node<V>>>;

/// A trie node: an optional stored value plus child edges.
pub(crate) struct Node<V> {
    pub(crate) value: Option<V>,
    strong: Option<IndexMap<ValueKey, NodeRef<V>>>,
    weak: Option<WeakEdges<V>>,
}

impl<V> Node<V> {
    pub(crate) fn new() -> Self {
        Self {
            value: None,
            strong: None,
            weak: None,
        }
    }

    pub(crate) fn new_ref() -> NodeRef<V> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Existing child for `part`. Dead identity edges count as absent.
    pub(crate) fn child(&self, part: &KeyPart) -> Option<NodeRef<V>> {
        match part {
            KeyPart::Value(key) => self.strong.as_ref()?.get(key).map(Rc::clone),
            KeyPart::Ref(key) => self.weak.as_ref()?.get(key),
        }
    }

    /// Existing or new child for `part`, and whether an edge was created.
    pub(crate) fn find_or_create_child(&mut self, part: &KeyPart) -> (NodeRef<V>, bool) {
        match part {
            KeyPart::Value(key) => {
                let strong = self.strong.get_or_insert_with(IndexMap::new);
                if let Some(existing) = strong.get(key) {
                    return (Rc::clone(existing), false);
                }
                let created = Self::new_ref();
                strong.insert(key.clone(), Rc::clone(&created));
                (created, true)
            }
            KeyPart::Ref(key) => {
                let weak = self.weak.get_or_insert_with(WeakEdges::new);
                if let Some(existing) = weak.get(key) {
                    return (existing, false);
                }
                let created = Self::new_ref();
                weak.insert(key.clone(), Rc::clone(&created));
                (created, true)
            }
        }
    }

    /// No value and no children.
    pub(crate) fn is_vacant(&self) -> bool {
        self.value.is_none()
            && self.strong.as_ref().is_none_or(IndexMap::is_empty)
            && self.weak.as_ref().is_none_or(|weak| weak.edges.is_empty())
    }

    /// Values stored at or below this node, through live edges only.
    pub(crate) fn live_len(&self) -> usize {
        let own = usize::from(self.value.is_some());
        let strong: usize = self
            .strong
            .iter()
            .flat_map(IndexMap::values)
            .map(|child| child.borrow().live_len())
            .sum();
        let weak: usize = self
            .weak
            .iter()
            .flat_map(|weak| weak.edges.values())
            .filter(|edge| edge.key.is_alive())
            .map(|edge| edge.node.borrow().live_len())
            .sum();
        own + strong + weak
    }

    /// Values stored at or below this node, dead edges included.
    fn total_len(&self) -> usize {
        let own = usize::from(self.value.is_some());
        let strong: usize = self
            .strong
            .iter()
            .flat_map(IndexMap::values)
            .map(|child| child.borrow().total_len())
            .sum();
        let weak: usize = self
            .weak
            .iter()
            .flat_map(|weak| weak.edges.values())
            .map(|edge| edge.node.borrow().total_len())
            .sum();
        own + strong + weak
    }

    /// Edges at or below this node, dead ones included.
    pub(crate) fn edge_count(&self) -> usize {
        let strong: usize = self
            .strong
            .iter()
            .flat_map(IndexMap::values)
            .map(|child| 1 + child.borrow().edge_count())
            .sum();
        let weak: usize = self
            .weak
            .iter()
            .flat_map(|weak| weak.edges.values())
            .map(|edge| 1 + edge.node.borrow().edge_count())
            .sum();
        strong + weak
    }

    /// Drop dead identity edges and empty nodes below this one.
    pub(crate) fn purge(&mut self, report: &mut PurgeReport) {
        if let Some(weak) = self.weak.as_mut() {
            weak.edges.retain(|_, edge| {
                if edge.key.is_alive() {
                    return true;
                }
                report.dead_edges += 1;
                report.reclaimed_values += edge.node.borrow().total_len();
                false
            });
            weak.edges.retain(|_, edge| purge_child(&edge.node, report));
            if weak.edges.is_empty() {
                self.weak = None;
            }
        }

        if let Some(strong) = self.strong.as_mut() {
            strong.retain(|_, child| purge_child(child, report));
            if strong.is_empty() {
                self.strong = None;
            }
        }
    }
}

/// Purge `child` and report whether it is still worth keeping. An empty
/// node that a pending entry handle still points at is kept.
fn purge_child<V>(child: &NodeRef<V>, report: &mut PurgeReport) -> bool {
    let mut node = child.borrow_mut();
    node.purge(report);
    if node.is_vacant() && Rc::strong_count(child) == 1 {
        report.empty_nodes += 1;
        return false;
    }
    true
}

struct WeakEdge<V> {
    key: RefKey,
    node: NodeRef<V>,
}

/// Identity-keyed edges, keyed by allocation address. A dead edge keeps its
/// address reserved, so only a key part that outlived its target can meet
/// one; such a lookup treats the edge as absent. Dead edges are removed by
/// [`Node::purge`].
struct WeakEdges<V> {
    edges: IndexMap<usize, WeakEdge<V>>,
}

impl<V> WeakEdges<V> {
    fn new() -> Self {
        Self { edges: IndexMap::new() }
    }

    fn get(&self, key: &RefKey) -> Option<NodeRef<V>> {
        self.edges
            .get(&key.addr())
            .filter(|edge| edge.key.is_alive())
            .map(|edge| Rc::clone(&edge.node))
    }

    fn insert(&mut self, key: RefKey, node: NodeRef<V>) {
        self.edges.insert(key.addr(), WeakEdge { key, node });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::ToKeyPart;

    #[test]
    fn test_child_absent_on_new_node() {
        let node: Node<u32> = Node::new();
        assert!(node.child(&"a".key_part()).is_none());
        assert!(node.is_vacant());
    }

    #[test]
    fn test_find_or_create_is_idempotent() {
        let mut node: Node<u32> = Node::new();
        let part = "a".key_part();
        let (first, created) = node.find_or_create_child(&part);
        let (second, again) = node.find_or_create_child(&part);
        assert!(Rc::ptr_eq(&first, &second));
        assert!(created);
        assert!(!again);
        assert!(!node.is_vacant());
    }

    #[test]
    fn test_dead_edge_is_absent() {
        let mut node: Node<u32> = Node::new();
        let obj = Rc::new(());
        let part = obj.key_part();
        node.find_or_create_child(&part);
        assert!(node.child(&part).is_some());
        drop(obj);
        assert!(node.child(&part).is_none());
        assert_eq!(node.edge_count(), 1);
    }

    #[test]
    fn test_edge_count() {
        let mut node: Node<u32> = Node::new();
        let (child, _) = node.find_or_create_child(&"a".key_part());
        child.borrow_mut().find_or_create_child(&1u8.key_part());
        node.find_or_create_child(&"b".key_part());
        assert_eq!(node.edge_count(), 3);
    }

    #[test]
    fn test_purge_keeps_node_held_by_handle() {
        let mut node: Node<u32> = Node::new();
        let obj = Rc::new(());
        let (held, _) = node.find_or_create_child(&"a".key_part());
        held.borrow_mut().find_or_create_child(&obj.key_part());
        drop(obj);

        let mut report = PurgeReport::new();
        node.purge(&mut report);
        assert_eq!(report.dead_edges, 1);
        assert_eq!(report.empty_nodes, 0);
        assert!(node.child(&"a".key_part()).is_some());

        drop(held);
        let mut report = PurgeReport::new();
        node.purge(&mut report);
        assert_eq!(report.empty_nodes, 1);
        assert!(node.is_vacant());
    }
}
