use hashbrown::HashTable;

use super::arena::NodeArena;
use super::node::NodeId;

/// The equivalence registry: one canonical node per equivalence class.
///
/// Entries are keyed by the recursive structural signature hash computed
/// by the arena; equality is structural equivalence. Entries are added
/// and removed only by the builder's minimization passes, and a node is
/// always de-registered before its structure is mutated, so the memoized
/// hash a node sits under stays in sync with its bucket.
#[derive(Default)]
pub(crate) struct Registry {
    table: HashTable<NodeId>,
}

impl Registry {
    /// Looks up the canonical representative equivalent to `id`, if any.
    pub(crate) fn find_equivalent(&self, arena: &mut NodeArena, id: NodeId) -> Option<NodeId> {
        let hash = arena.signature_hash(id);
        self.table
            .find(hash, |&candidate| arena.equivalent(candidate, id))
            .copied()
    }

    /// Registers `id` as the canonical representative of its class.
    pub(crate) fn insert(&mut self, arena: &mut NodeArena, id: NodeId) {
        let hash = arena.signature_hash(id);
        self.table.insert_unique(hash, id, |&registered| {
            // Registered nodes are canonical; their memo is always warm.
            arena
                .node(registered)
                .hash_memo()
                .expect("registered node lost its hash memo")
        });
    }

    /// Removes `id`'s entry if `id` itself is the registered
    /// representative of its class. Equivalent entries held by other
    /// nodes are left alone.
    pub(crate) fn remove_if_registered(&mut self, arena: &mut NodeArena, id: NodeId) {
        let hash = arena.signature_hash(id);
        if let Ok(entry) = self.table.find_entry(hash, |&candidate| candidate == id) {
            let _ = entry.remove();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.table.len()
    }
}
