//! The mutable word graph: online construction with add and remove.
//!
//! The graph is kept minimal after every completed operation. Addition
//! walks the longest stored prefix, clones any shared stretch past the
//! first confluence node, appends the new suffix, and re-minimizes the
//! changed path bottom-up through the equivalence registry. Removal is
//! the mirror image: clone shared stretches, drop the accept flag or
//! detach the word's sole tail, then re-minimize.

use std::collections::BTreeSet;
use std::io::BufRead;

use hashbrown::HashSet;
use mark_last::MarkLastIterator;
use smallvec::SmallVec;

use crate::error::Result;

use super::arena::NodeArena;
use super::letters::{self, Letter, Word};
use super::node::NodeId;
use super::registry::Registry;
use super::search::Automaton;
use super::set::DawgSet;

/// A mutable string set stored as a minimal acyclic word graph.
///
/// Words can be added and removed in any order; the graph stays minimal
/// (no two reachable nodes are equivalent) after each call. Batch
/// insertion in sorted order is the fastest path: minimization of each
/// word is delayed until the next word shows which part of the path can
/// no longer grow.
///
/// # Examples
///
/// ```
/// use dawgset::{DawgSet, MutableDawg};
///
/// let mut dawg = MutableDawg::new();
/// dawg.add_all(["bake", "cake", "fake"]);
/// assert!(dawg.contains("cake"));
///
/// dawg.add("lake");
/// dawg.remove("bake");
/// let words: Vec<String> = dawg.iter().collect();
/// assert_eq!(words, ["cake", "fake", "lake"]);
/// ```
pub struct MutableDawg {
    arena: NodeArena,
    registry: Registry,
    letters: BTreeSet<Letter>,
    transition_count: usize,
    size: usize,
    max_length: usize,
}

impl MutableDawg {
    /// Creates an empty graph without the incoming-transition index.
    pub fn new() -> Self {
        Self::with_config(false)
    }

    /// Creates an empty graph that maintains reverse edges, enabling
    /// the backward execution mode for suffix queries. Roughly doubles
    /// the per-node memory footprint.
    pub fn with_incoming_transitions() -> Self {
        Self::with_config(true)
    }

    fn with_config(with_incoming: bool) -> Self {
        MutableDawg {
            arena: NodeArena::new(with_incoming),
            registry: Registry::default(),
            letters: BTreeSet::new(),
            transition_count: 0,
            size: 0,
            max_length: 0,
        }
    }

    /// Whether reverse edges are maintained.
    pub fn is_with_incoming_transitions(&self) -> bool {
        self.arena.with_incoming()
    }

    /// Switches the incoming-transition index on or off.
    ///
    /// # Panics
    ///
    /// The index is built from the first insertion on, so this panics
    /// if any word has ever been stored.
    pub fn set_with_incoming_transitions(&mut self, with_incoming: bool) {
        assert!(
            self.size == 0 && self.transition_count == 0,
            "the incoming-transition index must be configured before the first insertion"
        );
        if with_incoming != self.arena.with_incoming() {
            self.arena = NodeArena::new(with_incoming);
        }
    }

    /// Adds a word. Returns true if it was not stored before.
    pub fn add(&mut self, word: &str) -> bool {
        let word = letters::encode(word);
        let added = self.add_string_internal(&word);
        if !word.is_empty() {
            self.replace_or_register(NodeId::SOURCE, &word);
        }
        added
    }

    /// Adds every word of an iterator. Returns true if anything changed.
    ///
    /// Consecutive words in sorted order share the delayed-minimization
    /// fast path; unsorted input is handled all the same.
    pub fn add_all<I, S>(&mut self, words: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut changed = false;
        let mut previous: Option<Word> = None;
        for word in words {
            let current = letters::encode(word.as_ref());
            self.delayed_add(&mut previous, current, &mut changed);
        }
        self.finish_delayed(previous);
        changed
    }

    /// Reads words from a byte source, one per line, and adds them all.
    ///
    /// Blank lines and lines starting with `#` are skipped. Returns
    /// true if anything changed; a read failure is propagated with the
    /// graph left in a consistent, minimal state.
    pub fn add_all_from_reader<R: BufRead>(&mut self, mut reader: R) -> Result<bool> {
        let mut changed = false;
        let mut previous: Option<Word> = None;
        let mut buf = String::with_capacity(80);
        loop {
            buf.clear();
            let bytes = match reader.read_line(&mut buf) {
                Ok(n) => n,
                Err(e) => {
                    self.finish_delayed(previous);
                    return Err(e.into());
                }
            };
            if bytes == 0 {
                break;
            }
            let line = buf.trim_end();
            if line.is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let current = letters::encode(line);
            self.delayed_add(&mut previous, current, &mut changed);
        }
        self.finish_delayed(previous);
        Ok(changed)
    }

    /// Removes a word. Returns true if it was stored.
    pub fn remove(&mut self, word: &str) -> bool {
        let word = letters::encode(word);
        // Check membership before touching anything: a failed remove
        // must not perturb the graph.
        match self.arena.walk(NodeId::SOURCE, &word) {
            Some(end) if self.arena.node(end).is_accept() => {}
            _ => return false,
        }
        if word.is_empty() {
            self.set_accept_status(NodeId::SOURCE, false);
            self.size -= 1;
            return true;
        }

        // Clone any stretch shared with other words so the path is
        // exclusively this word's, then de-register it for mutation.
        if let Some((confluence_index, _)) = self.first_confluence(NodeId::SOURCE, &word) {
            self.clear_register_entries(&word[..confluence_index]);
            self.clone_path_tail(confluence_index, &word);
        }
        self.clear_register_entries(&word);

        let end = self
            .arena
            .walk(NodeId::SOURCE, &word)
            .expect("word path exists after splitting");
        if self.arena.node(end).has_children() {
            self.set_accept_status(end, false);
            self.replace_or_register(NodeId::SOURCE, &word);
        } else {
            let sole_length = self.sole_path_length(&word);
            let internal_length = word.len() - 1;
            if sole_length == internal_length {
                self.detach_child(NodeId::SOURCE, word[0]);
            } else {
                let cut = internal_length - sole_length;
                let parent = self
                    .arena
                    .walk(NodeId::SOURCE, &word[..cut])
                    .expect("retained prefix path exists");
                self.detach_child(parent, word[cut]);
                self.replace_or_register(NodeId::SOURCE, &word[..cut]);
            }
        }
        self.size -= 1;
        true
    }

    /// Removes and returns the smallest word.
    pub fn poll_first(&mut self) -> Option<String> {
        let word = self.first()?;
        self.remove(&word);
        Some(word)
    }

    /// Removes and returns the largest word.
    pub fn poll_last(&mut self) -> Option<String> {
        let word = self.last()?;
        self.remove(&word);
        Some(word)
    }

    /// The number of registered equivalence classes. In a minimal graph
    /// every reachable node except the source is registered.
    pub fn equivalence_class_count(&self) -> usize {
        self.registry.len()
    }

    /// Rebuilds the alphabet from the transitions still alive.
    ///
    /// Removal never shrinks the collected letter set on its own; call
    /// this before [`compress`](MutableDawg::compress) to drop labels
    /// that no longer occur, tightening the compact form's records.
    pub fn optimize_letters(&mut self) {
        let mut letters = BTreeSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![NodeId::SOURCE];
        while let Some(node) = stack.pop() {
            if visited.insert(node) {
                for &(letter, child) in self.arena.node(node).edges() {
                    letters.insert(letter);
                    stack.push(child);
                }
            }
        }
        self.letters = letters;
    }

    /// Projects the graph into its compact read-only form.
    pub fn compress(&self) -> super::compact::CompactDawg {
        super::compact::compress_graph(self)
    }

    pub(crate) fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub(crate) fn letter_table(&self) -> &BTreeSet<Letter> {
        &self.letters
    }

    // --- delayed batch minimization ---

    fn delayed_add(&mut self, previous: &mut Option<Word>, current: Word, changed: &mut bool) {
        if let Some(prev) = previous.as_deref() {
            // The stretch of the previous word no longer shared with the
            // current one cannot grow any further; minimize it now.
            if let Some(mps) = mps_index(prev, &current) {
                let origin = self
                    .arena
                    .walk(NodeId::SOURCE, &prev[..mps])
                    .expect("previous word's path exists");
                self.replace_or_register(origin, &prev[mps..]);
            }
        }
        *changed |= self.add_string_internal(&current);
        *previous = Some(current);
    }

    fn finish_delayed(&mut self, previous: Option<Word>) {
        if let Some(prev) = previous {
            if !prev.is_empty() {
                self.replace_or_register(NodeId::SOURCE, &prev);
            }
        }
    }

    // --- addition ---

    fn add_string_internal(&mut self, word: &[Letter]) -> bool {
        self.max_length = self.max_length.max(word.len());

        // Longest prefix of `word` already present as a path.
        let mut prefix_len = 0;
        let mut current = NodeId::SOURCE;
        for &letter in word {
            match self.arena.node(current).child(letter) {
                Some(next) => {
                    current = next;
                    prefix_len += 1;
                }
                None => break,
            }
        }

        let confluence = self.first_confluence(NodeId::SOURCE, &word[..prefix_len]);

        // De-register the nodes about to change: everything up to the
        // first confluence (the stretch past it is cloned, leaving the
        // originals untouched), or the whole prefix path if none.
        match confluence {
            Some((index, _)) => self.clear_register_entries(&word[..index]),
            None => self.clear_register_entries(&word[..prefix_len]),
        }
        if let Some((index, _)) = confluence {
            self.clone_path_tail(index, &word[..prefix_len]);
        }

        let origin = self
            .arena
            .walk(NodeId::SOURCE, &word[..prefix_len])
            .expect("prefix path exists");
        self.add_suffix_chain(origin, &word[prefix_len..])
    }

    fn add_suffix_chain(&mut self, origin: NodeId, suffix: &[Letter]) -> bool {
        if suffix.is_empty() {
            if self.set_accept_status(origin, true) {
                self.size += 1;
                true
            } else {
                false
            }
        } else {
            let mut current = origin;
            for (is_last, letter) in suffix.iter().copied().mark_last() {
                current = self.attach_new_child(current, letter, is_last);
            }
            self.size += 1;
            true
        }
    }

    // --- minimization ---

    /// Post-order minimization of the path spelled by `word` from
    /// `origin`: each node is either replaced by its registered
    /// equivalent or becomes the representative of its class.
    fn replace_or_register(&mut self, origin: NodeId, word: &[Letter]) {
        let letter = word[0];
        let target = self
            .arena
            .node(origin)
            .child(letter)
            .expect("minimization path exists");
        if self.arena.node(target).has_children() && word.len() > 1 {
            self.replace_or_register(target, &word[1..]);
        }
        match self.registry.find_equivalent(&mut self.arena, target) {
            None => self.registry.insert(&mut self.arena, target),
            Some(equivalent) if equivalent != target => {
                // The children below `target` are already canonical and
                // shared with `equivalent`, so dropping `target` leaves
                // them alive.
                self.retarget(origin, letter, equivalent);
            }
            Some(_) => {}
        }
    }

    /// Removes the register entries of the nodes along `word`'s path
    /// and clears their hash memos, preparing them for mutation.
    fn clear_register_entries(&mut self, word: &[Letter]) {
        let mut current = NodeId::SOURCE;
        for &letter in word {
            match self.arena.node(current).child(letter) {
                Some(next) => {
                    self.registry.remove_if_registered(&mut self.arena, next);
                    self.arena.node_mut(next).clear_hash_memo();
                    current = next;
                }
                None => break,
            }
        }
    }

    // --- confluence handling ---

    /// Finds the first node with two or more incoming transitions along
    /// `word` from `origin`. Returns the index of the letter leading
    /// into it, plus the node.
    fn first_confluence(&self, origin: NodeId, word: &[Letter]) -> Option<(usize, NodeId)> {
        let mut current = origin;
        for (i, &letter) in word.iter().enumerate() {
            match self.arena.node(current).child(letter) {
                Some(next) => {
                    if self.arena.node(next).is_confluence() {
                        return Some((i, next));
                    }
                    current = next;
                }
                None => return None,
            }
        }
        None
    }

    /// Copy-on-write of the path stretch shared with other words: the
    /// node entered by `word[confluence_index]` and everything after it
    /// along `word` is cloned, and the parent edge moved to the clone.
    /// Cloning a node turns its successor on the path into a confluence
    /// in turn, which is why the whole tail is copied.
    fn clone_path_tail(&mut self, confluence_index: usize, word: &[Letter]) {
        let parent = self
            .arena
            .walk(NodeId::SOURCE, &word[..confluence_index])
            .expect("confluence parent exists");
        let mut original = self
            .arena
            .node(parent)
            .child(word[confluence_index])
            .expect("confluence node exists");
        let mut clone = self.clone_node(original);
        self.retarget(parent, word[confluence_index], clone);
        for &letter in &word[confluence_index + 1..] {
            let next_original = self
                .arena
                .node(original)
                .child(letter)
                .expect("cloned path exists");
            let next_clone = self.clone_node(next_original);
            self.retarget(clone, letter, next_clone);
            original = next_original;
            clone = next_clone;
        }
    }

    /// Length of the trailing stretch of `word`'s internal path used by
    /// no other word: nodes with at most one outgoing transition that
    /// are not accept states, counted from the word's end with the
    /// endpoint excluded.
    fn sole_path_length(&self, word: &[Letter]) -> usize {
        let path = self.arena.walk_path(NodeId::SOURCE, word);
        debug_assert_eq!(path.len(), word.len());
        path[..path.len() - 1]
            .iter()
            .rev()
            .take_while(|&&node| {
                self.arena.node(node).out_degree() <= 1 && !self.arena.node(node).is_accept()
            })
            .count()
    }

    // --- edge bookkeeping ---
    //
    // Every structural change goes through these helpers so that the
    // incoming counts, the optional reverse-edge index, the end node's
    // accept-edge index, and the transition counter stay coherent.

    fn link(&mut self, parent: NodeId, letter: Letter, child: NodeId) {
        self.arena.node_mut(child).increment_incoming();
        if self.arena.with_incoming() {
            self.arena.node_mut(child).record_incoming(letter, parent);
            if self.arena.node(child).is_accept() {
                self.arena
                    .node_mut(NodeId::END)
                    .record_incoming(letter, child);
            }
        }
    }

    fn unlink(&mut self, parent: NodeId, letter: Letter, child: NodeId) {
        let remaining = self.arena.node_mut(child).decrement_incoming();
        if self.arena.with_incoming() {
            self.arena.node_mut(child).forget_incoming(letter, parent);
            if self.arena.node(child).is_accept() {
                // The end node keys accept states by the labels still
                // entering them.
                let label_gone = self
                    .arena
                    .node(child)
                    .incoming()
                    .map_or(true, |index| !index.contains_key(&letter));
                if label_gone {
                    self.arena
                        .node_mut(NodeId::END)
                        .forget_incoming(letter, child);
                }
            }
        }
        if remaining == 0 {
            self.release(child);
        }
    }

    fn attach_new_child(&mut self, parent: NodeId, letter: Letter, accept: bool) -> NodeId {
        let child = self.arena.alloc(accept);
        self.arena.node_mut(parent).insert_edge(letter, child);
        self.transition_count += 1;
        self.letters.insert(letter);
        self.link(parent, letter, child);
        child
    }

    fn detach_child(&mut self, parent: NodeId, letter: Letter) {
        let child = self
            .arena
            .node_mut(parent)
            .remove_edge(letter)
            .expect("detached edge exists");
        self.transition_count -= 1;
        self.unlink(parent, letter, child);
    }

    fn retarget(&mut self, parent: NodeId, letter: Letter, new_child: NodeId) {
        let old_child = self.arena.node_mut(parent).retarget_edge(letter, new_child);
        // Link before unlinking: the new child may live inside the old
        // child's subtree.
        self.link(parent, letter, new_child);
        self.unlink(parent, letter, old_child);
    }

    /// Frees a node whose last incoming transition is gone, cascading
    /// along children whose counts also reach zero. Callers have
    /// already removed the register entries of everything reachable
    /// here.
    fn release(&mut self, node: NodeId) {
        let edges: SmallVec<[(Letter, NodeId); 8]> =
            self.arena.node(node).edges().iter().copied().collect();
        for (letter, child) in edges {
            self.transition_count -= 1;
            self.unlink(node, letter, child);
        }
        self.arena.free_slot(node);
    }

    fn clone_node(&mut self, original: NodeId) -> NodeId {
        let accept = self.arena.node(original).is_accept();
        let edges: SmallVec<[(Letter, NodeId); 8]> =
            self.arena.node(original).edges().iter().copied().collect();
        let clone = self.arena.alloc(accept);
        for (letter, child) in edges {
            self.arena.node_mut(clone).insert_edge(letter, child);
            self.transition_count += 1;
            self.link(clone, letter, child);
        }
        clone
    }

    fn set_accept_status(&mut self, node: NodeId, accept: bool) -> bool {
        let changed = self.arena.node_mut(node).set_accept(accept);
        if changed && self.arena.with_incoming() {
            let labels: SmallVec<[Letter; 8]> = self
                .arena
                .node(node)
                .incoming()
                .map(|index| index.keys().copied().collect())
                .unwrap_or_default();
            for letter in labels {
                if accept {
                    self.arena
                        .node_mut(NodeId::END)
                        .record_incoming(letter, node);
                } else {
                    self.arena
                        .node_mut(NodeId::END)
                        .forget_incoming(letter, node);
                }
            }
        }
        changed
    }
}

/// The minimization-processing start index: the first position where
/// `prev` stops being a prefix of `curr`. `None` means `prev` is still
/// a prefix of `curr`, so no part of its path can be frozen yet.
fn mps_index(prev: &[Letter], curr: &[Letter]) -> Option<usize> {
    if curr.starts_with(prev) {
        return None;
    }
    Some(prev.iter().zip(curr).take_while(|(a, b)| a == b).count())
}

impl Default for MutableDawg {
    fn default() -> Self {
        MutableDawg::new()
    }
}

impl<S: AsRef<str>> FromIterator<S> for MutableDawg {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut dawg = MutableDawg::new();
        dawg.add_all(iter);
        dawg
    }
}

impl std::fmt::Debug for MutableDawg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutableDawg")
            .field("len", &self.size)
            .field("node_count", &self.node_count())
            .field("transition_count", &self.transition_count)
            .finish()
    }
}

struct EdgeIter<'a> {
    edges: &'a [(Letter, NodeId)],
    descending: bool,
}

impl Iterator for EdgeIter<'_> {
    type Item = (Letter, NodeId);

    fn next(&mut self) -> Option<(Letter, NodeId)> {
        let (&edge, rest) = if self.descending {
            self.edges.split_last()?
        } else {
            self.edges.split_first()?
        };
        self.edges = rest;
        Some(edge)
    }
}

impl Automaton for MutableDawg {
    type Node = NodeId;

    fn source(&self) -> NodeId {
        NodeId::SOURCE
    }

    fn is_accept(&self, node: NodeId) -> bool {
        self.arena.node(node).is_accept()
    }

    fn child(&self, node: NodeId, letter: Letter) -> Option<NodeId> {
        self.arena.node(node).child(letter)
    }

    fn outgoing_transitions(
        &self,
        node: NodeId,
        descending: bool,
    ) -> impl Iterator<Item = (Letter, NodeId)> + '_ {
        EdgeIter {
            edges: self.arena.node(node).edges(),
            descending,
        }
    }

    fn incoming_transitions(
        &self,
        node: NodeId,
        descending: bool,
    ) -> impl Iterator<Item = (Letter, NodeId)> + '_ {
        let mut pairs: Vec<(Letter, NodeId)> = Vec::new();
        if let Some(index) = self.arena.node(node).incoming() {
            if descending {
                for (&letter, predecessors) in index.iter().rev() {
                    pairs.extend(predecessors.iter().map(|&p| (letter, p)));
                }
            } else {
                for (&letter, predecessors) in index.iter() {
                    pairs.extend(predecessors.iter().map(|&p| (letter, p)));
                }
            }
        }
        pairs.into_iter()
    }

    fn max_word_length(&self) -> usize {
        self.max_length
    }

    fn suffix_origins(&self, suffix: &[Letter]) -> Option<Vec<NodeId>> {
        if !self.arena.with_incoming() {
            return None;
        }
        debug_assert!(!suffix.is_empty());
        // The end node's reverse edges name the accept states entered by
        // the suffix's last letter; from there, walk every suffix edge
        // backward to the states the whole suffix hangs off.
        let last = suffix[suffix.len() - 1];
        let mut current: Vec<NodeId> = self
            .arena
            .node(NodeId::END)
            .incoming()
            .and_then(|index| index.get(&last))
            .map(|accepts| accepts.iter().copied().collect())
            .unwrap_or_default();
        for &letter in suffix.iter().rev() {
            if current.is_empty() {
                break;
            }
            let mut previous = Vec::new();
            for node in &current {
                if let Some(predecessors) = self
                    .arena
                    .node(*node)
                    .incoming()
                    .and_then(|index| index.get(&letter))
                {
                    previous.extend(predecessors.iter().copied());
                }
            }
            current = previous;
        }
        Some(current)
    }
}

impl DawgSet for MutableDawg {
    fn len(&self) -> usize {
        self.size
    }

    fn node_count(&self) -> usize {
        let mut visited = HashSet::new();
        let mut stack = vec![NodeId::SOURCE];
        while let Some(node) = stack.pop() {
            if visited.insert(node) {
                for &(_, child) in self.arena.node(node).edges() {
                    stack.push(child);
                }
            }
        }
        visited.len()
    }

    fn transition_count(&self) -> usize {
        self.transition_count
    }
}
