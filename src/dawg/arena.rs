use std::hash::{BuildHasher, Hash, Hasher};

use hashbrown::DefaultHashBuilder;
use smallvec::SmallVec;

use super::letters::Letter;
use super::node::{Node, NodeId};

/// Owner of all mutable nodes, indexed by [`NodeId`].
///
/// Freed slots are recycled through a free list; the graph is acyclic
/// with a single source, so a node whose incoming count reaches zero can
/// never be resurrected. Slot 0 is the source node and slot 1 the
/// virtual end node; neither is ever freed.
pub(crate) struct NodeArena {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    with_incoming: bool,
    hash_builder: DefaultHashBuilder,
}

impl NodeArena {
    pub(crate) fn new(with_incoming: bool) -> Self {
        NodeArena {
            nodes: vec![Node::new(false, with_incoming), Node::new(false, with_incoming)],
            free: Vec::new(),
            with_incoming,
            hash_builder: DefaultHashBuilder::default(),
        }
    }

    #[inline]
    pub(crate) fn with_incoming(&self) -> bool {
        self.with_incoming
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Allocates a fresh node, reusing a freed slot when one exists.
    pub(crate) fn alloc(&mut self, accept: bool) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()].reset(accept, self.with_incoming);
                id
            }
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(Node::new(accept, self.with_incoming));
                id
            }
        }
    }

    /// Returns a slot to the free list.
    ///
    /// The caller must have detached every edge first; the node's
    /// incoming count is zero by then.
    pub(crate) fn free_slot(&mut self, id: NodeId) {
        debug_assert!(id != NodeId::SOURCE && id != NodeId::END);
        debug_assert_eq!(self.node(id).incoming_count(), 0);
        self.nodes[id.index()].reset(false, false);
        self.free.push(id);
    }

    /// Follows the transition path for `word` from `from`.
    pub(crate) fn walk(&self, from: NodeId, word: &[Letter]) -> Option<NodeId> {
        word.iter()
            .try_fold(from, |n, &letter| self.node(n).child(letter))
    }

    /// Collects the nodes along `word`'s path from `from`, excluding
    /// `from` itself. Stops early if the path does not exist.
    pub(crate) fn walk_path(&self, from: NodeId, word: &[Letter]) -> Vec<NodeId> {
        let mut path = Vec::with_capacity(word.len());
        let mut current = from;
        for &letter in word {
            match self.node(current).child(letter) {
                Some(next) => {
                    path.push(next);
                    current = next;
                }
                None => break,
            }
        }
        path
    }

    /// The structural signature hash of a node: accept flag plus the
    /// `(label, child signature)` pairs, recursively.
    ///
    /// Memoized per node; mutations clear the memo, and nodes below the
    /// mutated path keep theirs, so the recursion rarely goes deep.
    pub(crate) fn signature_hash(&mut self, id: NodeId) -> u64 {
        if let Some(hash) = self.node(id).hash_memo() {
            return hash;
        }
        let edges: SmallVec<[(Letter, NodeId); 8]> =
            self.node(id).edges().iter().copied().collect();
        let mut hasher = self.hash_builder.build_hasher();
        self.node(id).is_accept().hash(&mut hasher);
        for (letter, child) in edges {
            let child_hash = self.signature_hash(child);
            letter.hash(&mut hasher);
            child_hash.hash(&mut hasher);
        }
        let hash = hasher.finish();
        self.node_mut(id).set_hash_memo(hash);
        hash
    }

    /// Structural equivalence: same accept flag and, label by label,
    /// equivalent children. Canonicalized children collapse to an id
    /// comparison on the first step.
    pub(crate) fn equivalent(&self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return true;
        }
        let na = self.node(a);
        let nb = self.node(b);
        if na.is_accept() != nb.is_accept() || na.out_degree() != nb.out_degree() {
            return false;
        }
        na.edges()
            .iter()
            .zip(nb.edges())
            .all(|(&(la, ca), &(lb, cb))| la == lb && self.equivalent(ca, cb))
    }
}
