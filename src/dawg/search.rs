//! The enumeration engine shared by both automaton representations.
//!
//! Every query (plain iteration, prefix/substring/suffix filters,
//! range slices, ascending or descending) funnels through [`Strings`],
//! a lazy depth-first traversal over anything implementing
//! [`Automaton`]. Filters are combined in a single pass; subtrees that
//! cannot contribute are pruned as soon as the bounds prove it.

use super::letters::{self, Letter, Word};

/// Read access to a word-graph representation.
///
/// Implemented by both the mutable builder and the compact form; the
/// enumeration engine and external consumers (such as graph renderers)
/// traverse either through this one contract.
pub trait Automaton {
    /// Handle to a state of the automaton.
    type Node: Copy + Eq + std::fmt::Debug;

    /// The state reached by the empty prefix.
    fn source(&self) -> Self::Node;

    /// Whether the path from the source to this node spells a stored word.
    fn is_accept(&self, node: Self::Node) -> bool;

    /// Follows one labeled transition.
    fn child(&self, node: Self::Node, letter: Letter) -> Option<Self::Node>;

    /// The node's outgoing transitions in ascending (or descending)
    /// label order.
    fn outgoing_transitions(
        &self,
        node: Self::Node,
        descending: bool,
    ) -> impl Iterator<Item = (Letter, Self::Node)> + '_;

    /// The node's incoming transitions, flattened to `(label,
    /// predecessor)` pairs. Empty unless the representation maintains a
    /// reverse-edge index.
    fn incoming_transitions(
        &self,
        node: Self::Node,
        descending: bool,
    ) -> impl Iterator<Item = (Letter, Self::Node)> + '_;

    /// The length of the longest stored word.
    fn max_word_length(&self) -> usize;

    /// Starting states for backward suffix expansion: the nodes from
    /// which `suffix` leads to an accept state. `None` when reverse
    /// edges are unavailable, which sends suffix queries down the
    /// forward path instead.
    fn suffix_origins(&self, suffix: &[Letter]) -> Option<Vec<Self::Node>>;

    /// Follows a whole transition path.
    fn walk(&self, from: Self::Node, word: &[Letter]) -> Option<Self::Node> {
        word.iter().try_fold(from, |n, &letter| self.child(n, letter))
    }
}

/// A combined enumeration filter.
///
/// The produced sequence contains exactly those stored words that start
/// with `prefix`, contain `substring`, end with `suffix`, and fall in
/// the `from`/`to` range, in lexicographic order (reversed when
/// descending).
///
/// ```
/// use dawgset::{DawgSet, MutableDawg, Query};
///
/// let mut dawg = MutableDawg::new();
/// dawg.add_all(["bac", "baca", "bacb", "bad", "bb"]);
/// let hits: Vec<String> = dawg
///     .search(Query::new().starting_with("ba").to("bacb", true))
///     .collect();
/// assert_eq!(hits, ["bac", "baca", "bacb"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Query {
    pub(crate) prefix: String,
    pub(crate) substring: String,
    pub(crate) suffix: String,
    pub(crate) descending: bool,
    pub(crate) from: Option<String>,
    pub(crate) incl_from: bool,
    pub(crate) to: Option<String>,
    pub(crate) incl_to: bool,
}

impl Query {
    /// An unfiltered ascending query.
    pub fn new() -> Self {
        Query::default()
    }

    /// Restricts results to words starting with `prefix`.
    pub fn starting_with(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Restricts results to words containing `substring`. The empty
    /// substring is always satisfied.
    pub fn containing(mut self, substring: &str) -> Self {
        self.substring = substring.to_string();
        self
    }

    /// Restricts results to words ending with `suffix`.
    pub fn ending_with(mut self, suffix: &str) -> Self {
        self.suffix = suffix.to_string();
        self
    }

    /// Reverses the output order.
    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    /// Sets the lower range bound.
    pub fn from(mut self, from: &str, inclusive: bool) -> Self {
        self.from = Some(from.to_string());
        self.incl_from = inclusive;
        self
    }

    /// Sets the upper range bound.
    pub fn to(mut self, to: &str, inclusive: bool) -> Self {
        self.to = Some(to.to_string());
        self.incl_to = inclusive;
        self
    }
}

/// Lazy stream of matching words; the result of [`Query`] evaluation.
///
/// Advances only when polled, holds a word buffer plus a traversal
/// stack, and borrows the automaton for its lifetime.
pub struct Strings<'a, A: Automaton> {
    mode: Mode<'a, A>,
}

enum Mode<'a, A: Automaton> {
    Done,
    Forward(ForwardWalk<'a, A>),
    Backward(BackwardWalk<'a, A>),
}

impl<'a, A: Automaton> Strings<'a, A> {
    pub(crate) fn new(dawg: &'a A, query: Query) -> Self {
        let suffix = letters::encode(&query.suffix);
        if !suffix.is_empty() && query.prefix.is_empty() {
            if let Some(origins) = dawg.suffix_origins(&suffix) {
                return Strings {
                    mode: match BackwardWalk::init(dawg, &query, &suffix, origins) {
                        Some(walk) => Mode::Backward(walk),
                        None => Mode::Done,
                    },
                };
            }
        }
        Strings {
            mode: match ForwardWalk::init(dawg, &query, &suffix) {
                Some(walk) => Mode::Forward(walk),
                None => Mode::Done,
            },
        }
    }
}

impl<A: Automaton> Iterator for Strings<'_, A> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match &mut self.mode {
            Mode::Done => None,
            Mode::Forward(walk) => walk.next_word(),
            Mode::Backward(walk) => walk.next_word(),
        }
    }
}

struct Frame<N> {
    /// `None` marks an emit frame: in descending order an accept node's
    /// word must come out after all longer words below it, so the word
    /// is re-pushed as a childless pseudo-node.
    node: Option<N>,
    /// Letters currently occupied in the buffer, prefix included.
    len: usize,
    letter: Letter,
    check_from: bool,
    check_to: bool,
    check_sub: bool,
}

/// Forward (prefix-first) traversal: the default execution mode.
struct ForwardWalk<'a, A: Automaton> {
    dawg: &'a A,
    buffer: Vec<Letter>,
    prefix_len: usize,
    stack: Vec<Frame<A::Node>>,
    from: Option<Word>,
    to: Option<Word>,
    sub: Option<Word>,
    suffix: Option<Word>,
    incl_from: bool,
    incl_to: bool,
    descending: bool,
}

fn contains_sub(haystack: &[Letter], needle: &[Letter]) -> bool {
    debug_assert!(!needle.is_empty());
    haystack.len() >= needle.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

impl<'a, A: Automaton> ForwardWalk<'a, A> {
    /// Resolves the bounds against the prefix and positions the stack.
    /// Returns `None` when the combination provably matches nothing.
    fn init(dawg: &'a A, query: &Query, suffix: &[Letter]) -> Option<Self> {
        let prefix = letters::encode(&query.prefix);
        let mut from = query.from.as_deref().map(letters::encode);
        let mut to = query.to.as_deref().map(letters::encode);
        let mut sub = Some(letters::encode(&query.substring));

        let mut origin = dawg.walk(dawg.source(), &prefix);
        if origin.is_some() {
            if let (Some(f), Some(t)) = (&from, &to) {
                // An inverted range matches nothing.
                if f > t || (f == t && (!query.incl_from || !query.incl_to)) {
                    origin = None;
                }
            }
        }
        if origin.is_some() {
            if let Some(f) = &from {
                if f.as_slice() < prefix.as_slice()
                    || (f.as_slice() == prefix.as_slice() && query.incl_from)
                {
                    // The whole prefix subtree lies above the bound.
                    from = None;
                } else if f.as_slice() > prefix.as_slice() && !f.starts_with(&prefix) {
                    origin = None;
                }
            }
        }
        if origin.is_some() {
            if let Some(t) = &to {
                if t.as_slice() < prefix.as_slice()
                    || (t.as_slice() == prefix.as_slice() && !query.incl_to)
                {
                    origin = None;
                } else if t.as_slice() > prefix.as_slice() && !t.starts_with(&prefix) {
                    to = None;
                }
            }
        }
        if let Some(s) = &sub {
            // An empty pattern is always satisfied; so is one already
            // present in the fixed prefix or the required suffix.
            if s.is_empty()
                || contains_sub(&prefix, s)
                || (!suffix.is_empty() && contains_sub(suffix, s))
            {
                sub = None;
            }
        }
        let origin = origin?;

        // A lower bound that is empty and inclusive admits everything.
        if let Some(f) = &from {
            if query.incl_from && f.is_empty() {
                from = None;
            }
        }

        let mut buffer = vec![0; dawg.max_word_length().max(prefix.len())];
        buffer[..prefix.len()].copy_from_slice(&prefix);
        Some(ForwardWalk {
            dawg,
            buffer,
            prefix_len: prefix.len(),
            stack: vec![Frame {
                node: Some(origin),
                len: prefix.len(),
                letter: 0,
                check_from: true,
                check_to: true,
                check_sub: true,
            }],
            from,
            to,
            sub,
            suffix: (!suffix.is_empty()).then(|| suffix.iter().copied().collect()),
            incl_from: query.incl_from,
            incl_to: query.incl_to,
            descending: query.descending,
        })
    }

    fn next_word(&mut self) -> Option<String> {
        loop {
            let frame = self.stack.pop()?;
            let len = frame.len;
            if len > self.prefix_len {
                self.buffer[len - 1] = frame.letter;
            }
            let mut check_from = frame.check_from;
            let mut check_to = frame.check_to;
            let mut check_sub = frame.check_sub;
            let mut skip_current = false;
            let mut skip_children = false;
            let has_children = frame
                .node
                .is_some_and(|n| self.dawg.outgoing_transitions(n, false).next().is_some());

            if check_from {
                if let Some(from) = &self.from {
                    if len > self.prefix_len {
                        // The current word extends the prefix, and the
                        // bound starts with the prefix (shorter bounds
                        // were resolved during init).
                        let mut from_equals_current = false;
                        let cmp = if from.len() > len - 1 {
                            match from[len - 1].cmp(&self.buffer[len - 1]) {
                                std::cmp::Ordering::Equal if len == from.len() => {
                                    // Every earlier letter matched, so the
                                    // bound equals the current word.
                                    from_equals_current = true;
                                    if !self.incl_from {
                                        skip_current = true;
                                    }
                                    std::cmp::Ordering::Less
                                }
                                other => other,
                            }
                        } else {
                            std::cmp::Ordering::Less
                        };
                        match cmp {
                            std::cmp::Ordering::Less => {
                                if self.descending {
                                    if !from_equals_current {
                                        check_from = false;
                                    }
                                } else {
                                    // Everything still on the stack is
                                    // larger; stop checking globally.
                                    self.from = None;
                                }
                            }
                            std::cmp::Ordering::Greater => {
                                if self.descending {
                                    // All remaining words are smaller
                                    // than this one, hence below the
                                    // bound too.
                                    self.stack.clear();
                                }
                                continue;
                            }
                            std::cmp::Ordering::Equal => {
                                // The bound starts with the current word,
                                // so the word itself is below the bound
                                // but its extensions may not be.
                                skip_current = true;
                            }
                        }
                    } else {
                        // The current word is the prefix itself.
                        skip_current = true;
                        if from.len() == self.prefix_len {
                            self.from = None;
                        }
                    }
                }
            }

            if check_to {
                if let Some(to) = &self.to {
                    if len > self.prefix_len {
                        let mut to_equals_current = false;
                        let cmp = if to.len() > len - 1 {
                            match to[len - 1].cmp(&self.buffer[len - 1]) {
                                std::cmp::Ordering::Equal if len == to.len() => {
                                    to_equals_current = true;
                                    if self.incl_to {
                                        std::cmp::Ordering::Greater
                                    } else {
                                        std::cmp::Ordering::Less
                                    }
                                }
                                other => other,
                            }
                        } else {
                            std::cmp::Ordering::Less
                        };
                        match cmp {
                            std::cmp::Ordering::Greater => {
                                if self.descending {
                                    if !to_equals_current || !has_children {
                                        self.to = None;
                                    }
                                } else if !to_equals_current {
                                    check_to = false;
                                }
                            }
                            std::cmp::Ordering::Less => {
                                if !self.descending {
                                    self.stack.clear();
                                }
                                continue;
                            }
                            std::cmp::Ordering::Equal => {}
                        }
                    } else if to.len() == self.prefix_len {
                        // The bound equals the prefix: only the prefix
                        // itself can still match.
                        skip_children = true;
                    }
                }
            }

            if check_sub {
                if let Some(sub) = &self.sub {
                    if len >= sub.len() && self.buffer[len - sub.len()..len] == sub[..] {
                        // Matched once; every extension keeps containing it.
                        check_sub = false;
                    } else {
                        skip_current = true;
                    }
                }
            }

            let accept = match frame.node {
                Some(n) => self.dawg.is_accept(n),
                None => true,
            };
            let mut emit_current = false;
            if accept && !skip_current {
                if !self.descending || !has_children {
                    emit_current = true;
                } else {
                    // Re-visit this word after its subtree.
                    self.stack.push(Frame {
                        node: None,
                        len,
                        letter: if len > self.prefix_len { self.buffer[len - 1] } else { 0 },
                        check_from,
                        check_to,
                        check_sub,
                    });
                }
            }
            if emit_current {
                if let Some(suffix) = &self.suffix {
                    emit_current =
                        len >= suffix.len() && self.buffer[len - suffix.len()..len] == suffix[..];
                }
            }

            if !skip_children {
                if let Some(node) = frame.node {
                    // Push in reverse order so the lexicographically
                    // first child is popped first.
                    let dawg = self.dawg;
                    for (letter, child) in dawg.outgoing_transitions(node, !self.descending) {
                        self.stack.push(Frame {
                            node: Some(child),
                            len: len + 1,
                            letter,
                            check_from,
                            check_to,
                            check_sub,
                        });
                    }
                }
            }

            if emit_current {
                return Some(letters::decode(&self.buffer[..len]));
            }
        }
    }
}

struct BackFrame<N> {
    node: N,
    /// Letters occupied at the tail of the buffer.
    level: usize,
    letter: Letter,
    check_sub: bool,
}

/// Backward traversal for suffix queries: starts at the accept-state
/// endpoints of the suffix and expands toward the source over reverse
/// edges, building each word right to left.
///
/// Emits the same multiset as the forward walk; output order is not
/// lexicographic.
struct BackwardWalk<'a, A: Automaton> {
    dawg: &'a A,
    buffer: Vec<Letter>,
    suffix_len: usize,
    stack: Vec<BackFrame<A::Node>>,
    from: Option<Word>,
    to: Option<Word>,
    sub: Option<Word>,
    incl_from: bool,
    incl_to: bool,
    descending: bool,
}

impl<'a, A: Automaton> BackwardWalk<'a, A> {
    fn init(dawg: &'a A, query: &Query, suffix: &[Letter], origins: Vec<A::Node>) -> Option<Self> {
        if origins.is_empty() {
            return None;
        }
        let mut buffer = vec![0; dawg.max_word_length()];
        let tail = buffer.len() - suffix.len();
        buffer[tail..].copy_from_slice(suffix);

        let sub_pattern = letters::encode(&query.substring);
        let sub = (!sub_pattern.is_empty() && !contains_sub(suffix, &sub_pattern))
            .then_some(sub_pattern);
        let from = query
            .from
            .as_deref()
            .map(letters::encode)
            .filter(|f| !query.incl_from || !f.is_empty());
        let to = query.to.as_deref().map(letters::encode);

        Some(BackwardWalk {
            dawg,
            buffer,
            suffix_len: suffix.len(),
            stack: origins
                .into_iter()
                .map(|node| BackFrame {
                    node,
                    level: suffix.len(),
                    letter: 0,
                    check_sub: true,
                })
                .collect(),
            from,
            to,
            sub,
            incl_from: query.incl_from,
            incl_to: query.incl_to,
            descending: query.descending,
        })
    }

    fn next_word(&mut self) -> Option<String> {
        loop {
            let frame = self.stack.pop()?;
            let level = frame.level;
            let pos = self.buffer.len() - level;
            if level > self.suffix_len {
                self.buffer[pos] = frame.letter;
            }
            let mut check_sub = frame.check_sub;
            let mut skip_current = false;
            if check_sub {
                if let Some(sub) = &self.sub {
                    // The pattern must occur somewhere; test it against
                    // the leftmost constructed position. Every position
                    // becomes leftmost eventually.
                    skip_current = level < sub.len();
                    if !skip_current {
                        skip_current = self.buffer[pos..pos + sub.len()] != sub[..];
                        check_sub = skip_current;
                    }
                }
            }

            let mut at_source = true;
            let dawg = self.dawg;
            for (letter, predecessor) in dawg.incoming_transitions(frame.node, self.descending) {
                at_source = false;
                self.stack.push(BackFrame {
                    node: predecessor,
                    level: level + 1,
                    letter,
                    check_sub,
                });
            }

            // Only the source has no incoming edges; reaching it means
            // the word is fully constructed.
            if !skip_current && at_source {
                let word = &self.buffer[pos..];
                if let Some(from) = &self.from {
                    match word.cmp(from.as_slice()) {
                        std::cmp::Ordering::Less => continue,
                        std::cmp::Ordering::Equal if !self.incl_from => continue,
                        _ => {}
                    }
                }
                if let Some(to) = &self.to {
                    match word.cmp(to.as_slice()) {
                        std::cmp::Ordering::Greater => continue,
                        std::cmp::Ordering::Equal if !self.incl_to => continue,
                        _ => {}
                    }
                }
                return Some(letters::decode(word));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dawg::builder::MutableDawg;
    use crate::dawg::set::DawgSet;

    fn range_query(
        prefix: &str,
        descending: bool,
        from: (&str, bool),
        to: (&str, bool),
    ) -> Query {
        Query::new()
            .starting_with(prefix)
            .descending(descending)
            .from(from.0, from.1)
            .to(to.0, to.1)
    }

    #[test]
    fn prefix_and_range_combine() {
        let mut dawg = MutableDawg::new();
        dawg.add_all([
            "aa", "aaa", "aab", "baaaa", "baba", "babb", "babbc", "bac", "baca", "bacb", "bacba",
            "bada", "badb", "badbc", "badd", "bb", "bcd", "cac", "cc",
        ]);

        let cases: [(&str, &str, Vec<&str>); 4] = [
            ("bac", "bad", vec!["bac", "baca", "bacb", "bacba"]),
            ("bac", "badb", vec!["bac", "baca", "bacb", "bacba", "bada", "badb"]),
            ("bacb", "badd", vec!["bacb", "bacba", "bada", "badb", "badbc", "badd"]),
            ("bac", "badc", vec!["bac", "baca", "bacb", "bacba", "bada", "badb", "badbc"]),
        ];
        for (from, to, expected) in cases {
            let ascending: Vec<String> = dawg
                .search(range_query("ba", false, (from, true), (to, true)))
                .collect();
            assert_eq!(ascending, expected, "[{from} .. {to}] ascending");

            let descending: Vec<String> = dawg
                .search(range_query("ba", true, (from, true), (to, true)))
                .collect();
            let mut reversed = expected.clone();
            reversed.reverse();
            assert_eq!(descending, reversed, "[{from} .. {to}] descending");
        }
    }

    #[test]
    fn exclusive_bounds_can_produce_nothing() {
        let mut dawg = MutableDawg::new();
        dawg.add_all(["", "b"]);
        let hits: Vec<String> = dawg
            .search(Query::new().from("", false).to("a", false))
            .collect();
        assert!(hits.is_empty());
    }

    #[test]
    fn open_range_spanning_everything() {
        let words = [
            "hddb", "hddd", "hddf", "hddh", "hdf", "hdfb", "hdfd", "hdff", "hdfh", "hdh", "hdhb",
            "hdhd", "hdhf", "hdhh", "hf", "hfb", "hfbb", "hfbd", "hfbf", "hfbh", "hfd", "hfdb",
            "hfdd", "hfdf", "hfdh", "hff", "hffb", "hffd", "hfff", "hffh", "hfh", "hfhb", "hfhd",
            "hfhf", "hfhh",
        ];
        let mut dawg = MutableDawg::new();
        dawg.add_all(words);

        let ascending: Vec<String> = dawg
            .search(Query::new().from("hdd", false).to("hgecc", false))
            .collect();
        assert_eq!(ascending, words);

        let mut reversed = words.to_vec();
        reversed.reverse();
        let descending: Vec<String> = dawg
            .search(
                Query::new()
                    .descending(true)
                    .from("hdd", false)
                    .to("hgecc", false),
            )
            .collect();
        assert_eq!(descending, reversed);
    }

    #[test]
    fn substring_filter_short_circuits() {
        let mut dawg = MutableDawg::new();
        dawg.add_all(["abab", "ababa", "ba", "bab", "cab", "cc"]);
        let hits: Vec<String> = dawg.strings_with_substring("ab").collect();
        assert_eq!(hits, ["abab", "ababa", "bab", "cab"]);

        let hits: Vec<String> = dawg.strings_with_substring("aba").collect();
        assert_eq!(hits, ["abab", "ababa"]);

        // The empty pattern is always satisfied.
        let hits: Vec<String> = dawg.strings_with_substring("").collect();
        assert_eq!(hits.len(), 6);
    }

    #[test]
    fn suffix_filter_without_reverse_edges() {
        let mut dawg = MutableDawg::new();
        dawg.add_all(["tet", "tetatet", "tata"]);
        let hits: Vec<String> = dawg.strings_ending_with("tet").collect();
        assert_eq!(hits, ["tet", "tetatet"]);
        let hits: Vec<String> = dawg.strings_ending_with("atet").collect();
        assert_eq!(hits, ["tetatet"]);
        let hits: Vec<String> = dawg
            .search(Query::new().ending_with("a").descending(true))
            .collect();
        assert_eq!(hits, ["tata"]);
    }

    fn reference(words: &[&str], query: &Query) -> Vec<String> {
        let mut hits: Vec<&str> = words
            .iter()
            .copied()
            .filter(|w| {
                w.starts_with(&query.prefix)
                    && w.contains(&query.substring)
                    && w.ends_with(&query.suffix)
                    && query.from.as_deref().map_or(true, |from| {
                        match crate::dawg::letters::cmp(w, from) {
                            std::cmp::Ordering::Less => false,
                            std::cmp::Ordering::Equal => query.incl_from,
                            std::cmp::Ordering::Greater => true,
                        }
                    })
                    && query.to.as_deref().map_or(true, |to| {
                        match crate::dawg::letters::cmp(w, to) {
                            std::cmp::Ordering::Greater => false,
                            std::cmp::Ordering::Equal => query.incl_to,
                            std::cmp::Ordering::Less => true,
                        }
                    })
            })
            .collect();
        hits.sort();
        if query.descending {
            hits.reverse();
        }
        hits.into_iter().map(String::from).collect()
    }

    #[test]
    fn every_filter_combination_matches_a_naive_scan() {
        // Deterministic word set over a tiny alphabet, so that bounds
        // and patterns collide with stored words in interesting ways.
        let mut words: Vec<String> = Vec::new();
        words.push(String::new());
        for i in 1..120u32 {
            let mut w = String::new();
            let mut n = i;
            while n > 0 {
                w.push(match n % 4 {
                    0 => 'b',
                    1 => 'd',
                    2 => 'f',
                    _ => 'h',
                });
                n /= 4;
            }
            if i % 3 != 0 {
                words.push(w);
            }
        }
        words.sort();
        words.dedup();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        let mut dawg = MutableDawg::new();
        dawg.add_all(&words);
        let compact = dawg.compress();

        let patterns = ["", "b", "d", "bd", "hf", "bdfh"];
        for prefix in patterns {
            for substring in patterns {
                for from in patterns {
                    for to in patterns {
                        for incl_from in [false, true] {
                            for incl_to in [false, true] {
                                for descending in [false, true] {
                                    let query = Query::new()
                                        .starting_with(prefix)
                                        .containing(substring)
                                        .descending(descending)
                                        .from(from, incl_from)
                                        .to(to, incl_to);
                                    let expected = reference(&words, &query);
                                    let actual: Vec<String> =
                                        dawg.search(query.clone()).collect();
                                    assert_eq!(
                                        actual, expected,
                                        "mutable: prefix {prefix:?} sub {substring:?} \
                                         {incl_from}{from:?}..{to:?}{incl_to} desc {descending}"
                                    );
                                    let actual: Vec<String> =
                                        compact.search(query).collect();
                                    assert_eq!(
                                        actual, expected,
                                        "compact: prefix {prefix:?} sub {substring:?} \
                                         {incl_from}{from:?}..{to:?}{incl_to} desc {descending}"
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn suffix_queries_match_the_naive_scan_in_both_modes() {
        let words = [
            "", "b", "bd", "bdb", "bdbd", "db", "dbd", "dbdb", "bb", "dd", "bdd", "ddb",
        ];
        let mut indexed = MutableDawg::with_incoming_transitions();
        indexed.add_all(words);
        let mut plain = MutableDawg::new();
        plain.add_all(words);

        let patterns = ["", "b", "d", "db", "bd", "bdb", "x"];
        for suffix in patterns {
            for substring in ["", "b", "db"] {
                for (from, to) in [(None, None), (Some("bd"), Some("dd"))] {
                    let mut query = Query::new().ending_with(suffix).containing(substring);
                    if let (Some(from), Some(to)) = (from, to) {
                        query = query.from(from, true).to(to, false);
                    }
                    let expected = reference(&words, &query);
                    let mut backward: Vec<String> = indexed.search(query.clone()).collect();
                    backward.sort();
                    let mut sorted_expected = expected.clone();
                    sorted_expected.sort();
                    assert_eq!(
                        backward, sorted_expected,
                        "backward: suffix {suffix:?} sub {substring:?}"
                    );
                    let forward: Vec<String> = plain.search(query).collect();
                    assert_eq!(
                        forward, expected,
                        "forward: suffix {suffix:?} sub {substring:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn descending_emits_short_words_after_their_extensions() {
        let mut dawg = MutableDawg::new();
        dawg.add_all(["a", "ab", "abc", "b"]);
        let descending: Vec<String> = dawg.descending_iter().collect();
        assert_eq!(descending, ["b", "abc", "ab", "a"]);
    }

    #[test]
    fn inverted_range_is_empty() {
        let mut dawg = MutableDawg::new();
        dawg.add_all(["a", "b", "c"]);
        assert_eq!(dawg.search(Query::new().from("c", true).to("a", true)).count(), 0);
        assert_eq!(dawg.search(Query::new().from("b", false).to("b", true)).count(), 0);
        assert_eq!(dawg.search(Query::new().from("b", true).to("b", true)).count(), 1);
    }
}
