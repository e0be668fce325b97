use std::collections::{BTreeMap, BTreeSet};

use smallvec::SmallVec;

use super::letters::Letter;

/// Handle to a state of a mutable word graph: an index into its arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The source node: the state reached by the empty prefix.
    pub(crate) const SOURCE: NodeId = NodeId(0);

    /// The virtual end node collecting accept-edge reverse transitions.
    pub(crate) const END: NodeId = NodeId(1);

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Reverse edges of a node: predecessors grouped by transition label,
/// keyed by id to disambiguate duplicates.
pub(crate) type IncomingIndex = BTreeMap<Letter, BTreeSet<NodeId>>;

/// A mutable node of the word graph.
///
/// Outgoing transitions are kept sorted by label; most nodes have one or
/// two children, so the edge list stays inline. The signature hash memo
/// is cleared by every structural mutation (invalidate-then-mutate); the
/// arena recomputes it lazily during minimization.
#[derive(Clone, Debug, Default)]
pub(crate) struct Node {
    accept: bool,
    edges: SmallVec<[(Letter, NodeId); 2]>,
    incoming_count: u32,
    hash_memo: Option<u64>,
    incoming: Option<Box<IncomingIndex>>,
}

impl Node {
    pub(crate) fn new(accept: bool, with_incoming: bool) -> Self {
        Node {
            accept,
            edges: SmallVec::new(),
            incoming_count: 0,
            hash_memo: None,
            incoming: with_incoming.then(|| Box::new(IncomingIndex::new())),
        }
    }

    #[inline]
    pub(crate) fn is_accept(&self) -> bool {
        self.accept
    }

    /// Sets the accept flag, returning true if it changed.
    pub(crate) fn set_accept(&mut self, accept: bool) -> bool {
        let changed = self.accept != accept;
        if changed {
            self.hash_memo = None;
            self.accept = accept;
        }
        changed
    }

    #[inline]
    pub(crate) fn edges(&self) -> &[(Letter, NodeId)] {
        &self.edges
    }

    #[inline]
    pub(crate) fn out_degree(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub(crate) fn has_children(&self) -> bool {
        !self.edges.is_empty()
    }

    /// Returns the target of the transition labeled `letter`, if any.
    #[inline]
    pub(crate) fn child(&self, letter: Letter) -> Option<NodeId> {
        self.edges
            .binary_search_by_key(&letter, |&(l, _)| l)
            .ok()
            .map(|i| self.edges[i].1)
    }

    /// Inserts a transition in sorted position.
    ///
    /// The label must not already be present.
    pub(crate) fn insert_edge(&mut self, letter: Letter, child: NodeId) {
        self.hash_memo = None;
        match self.edges.binary_search_by_key(&letter, |&(l, _)| l) {
            Ok(_) => debug_assert!(false, "insert_edge: label already present"),
            Err(pos) => self.edges.insert(pos, (letter, child)),
        }
    }

    /// Removes the transition labeled `letter`, returning its target.
    pub(crate) fn remove_edge(&mut self, letter: Letter) -> Option<NodeId> {
        self.hash_memo = None;
        self.edges
            .binary_search_by_key(&letter, |&(l, _)| l)
            .ok()
            .map(|i| self.edges.remove(i).1)
    }

    /// Points the transition labeled `letter` at `new_child`, returning
    /// the previous target. The label must be present.
    pub(crate) fn retarget_edge(&mut self, letter: Letter, new_child: NodeId) -> NodeId {
        self.hash_memo = None;
        let i = self
            .edges
            .binary_search_by_key(&letter, |&(l, _)| l)
            .expect("retarget_edge: label not present");
        std::mem::replace(&mut self.edges[i].1, new_child)
    }

    #[inline]
    pub(crate) fn incoming_count(&self) -> u32 {
        self.incoming_count
    }

    /// A confluence node has two or more incoming transitions.
    #[inline]
    pub(crate) fn is_confluence(&self) -> bool {
        self.incoming_count > 1
    }

    #[inline]
    pub(crate) fn increment_incoming(&mut self) {
        self.incoming_count += 1;
    }

    #[inline]
    pub(crate) fn decrement_incoming(&mut self) -> u32 {
        debug_assert!(self.incoming_count > 0, "incoming count underflow");
        self.incoming_count -= 1;
        self.incoming_count
    }

    #[inline]
    pub(crate) fn hash_memo(&self) -> Option<u64> {
        self.hash_memo
    }

    #[inline]
    pub(crate) fn set_hash_memo(&mut self, hash: u64) {
        self.hash_memo = Some(hash);
    }

    #[inline]
    pub(crate) fn clear_hash_memo(&mut self) {
        self.hash_memo = None;
    }

    #[inline]
    pub(crate) fn incoming(&self) -> Option<&IncomingIndex> {
        self.incoming.as_deref()
    }

    pub(crate) fn record_incoming(&mut self, letter: Letter, from: NodeId) {
        if let Some(index) = self.incoming.as_deref_mut() {
            index.entry(letter).or_default().insert(from);
        }
    }

    pub(crate) fn forget_incoming(&mut self, letter: Letter, from: NodeId) {
        if let Some(index) = self.incoming.as_deref_mut() {
            if let Some(set) = index.get_mut(&letter) {
                set.remove(&from);
                if set.is_empty() {
                    index.remove(&letter);
                }
            }
        }
    }

    /// Resets the slot for reuse from the free list.
    pub(crate) fn reset(&mut self, accept: bool, with_incoming: bool) {
        self.accept = accept;
        self.edges.clear();
        self.incoming_count = 0;
        self.hash_memo = None;
        self.incoming = with_incoming.then(|| Box::new(IncomingIndex::new()));
    }
}
