//! The navigable string-set surface shared by both representations.

use std::cmp::Ordering;

use crate::error::{DawgError, Result};

use super::letters;
use super::search::{Automaton, Query, Strings};

/// Ordered string-set operations over a word graph.
///
/// Implemented by [`MutableDawg`](super::builder::MutableDawg) and
/// [`CompactDawg`](super::compact::CompactDawg); every method is a thin
/// projection of [`DawgSet::search`]. Iteration order is lexicographic
/// by UTF-16 code units.
pub trait DawgSet: Automaton + Sized {
    /// The number of stored words.
    fn len(&self) -> usize;

    /// True if no words are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of reachable nodes, the source included.
    fn node_count(&self) -> usize;

    /// The number of transitions between nodes.
    fn transition_count(&self) -> usize;

    /// Whether `word` is stored.
    fn contains(&self, word: &str) -> bool {
        self.walk(self.source(), &letters::encode(word))
            .is_some_and(|n| self.is_accept(n))
    }

    /// Evaluates a combined query lazily.
    fn search(&self, query: Query) -> Strings<'_, Self> {
        Strings::new(self, query)
    }

    /// All words in ascending order.
    fn iter(&self) -> Strings<'_, Self> {
        self.search(Query::new())
    }

    /// All words in descending order.
    fn descending_iter(&self) -> Strings<'_, Self> {
        self.search(Query::new().descending(true))
    }

    /// Words starting with `prefix`, ascending.
    fn strings_starting_with<'a>(&'a self, prefix: &str) -> Strings<'a, Self> {
        self.search(Query::new().starting_with(prefix))
    }

    /// Words containing `substring`, ascending.
    fn strings_with_substring<'a>(&'a self, substring: &str) -> Strings<'a, Self> {
        self.search(Query::new().containing(substring))
    }

    /// Words ending with `suffix`.
    ///
    /// When the backing automaton maintains reverse edges this runs
    /// backward from the accept states and the output order is
    /// unspecified; otherwise it is ascending.
    fn strings_ending_with<'a>(&'a self, suffix: &str) -> Strings<'a, Self> {
        self.search(Query::new().ending_with(suffix))
    }

    /// The smallest stored word.
    fn first(&self) -> Option<String> {
        self.iter().next()
    }

    /// The largest stored word.
    fn last(&self) -> Option<String> {
        self.descending_iter().next()
    }

    /// The largest stored word strictly below `word`.
    fn lower(&self, word: &str) -> Option<String> {
        self.search(Query::new().descending(true).to(word, false)).next()
    }

    /// The largest stored word at or below `word`.
    fn floor(&self, word: &str) -> Option<String> {
        self.search(Query::new().descending(true).to(word, true)).next()
    }

    /// The smallest stored word at or above `word`.
    fn ceiling(&self, word: &str) -> Option<String> {
        self.search(Query::new().from(word, true)).next()
    }

    /// The smallest stored word strictly above `word`.
    fn higher(&self, word: &str) -> Option<String> {
        self.search(Query::new().from(word, false)).next()
    }

    /// A live view of the words between `from` and `to`.
    ///
    /// Fails with [`DawgError::OutOfRange`] when `from` exceeds `to`.
    fn sub_set<'a>(
        &'a self,
        from: &str,
        incl_from: bool,
        to: &str,
        incl_to: bool,
    ) -> Result<SubSet<'a, Self>> {
        if letters::cmp(from, to) == Ordering::Greater {
            return Err(DawgError::OutOfRange);
        }
        let from = (!(incl_from && from.is_empty())).then(|| from.to_string());
        Ok(SubSet {
            dawg: self,
            prefix: String::new(),
            descending: false,
            from,
            incl_from,
            to: Some(to.to_string()),
            incl_to,
        })
    }

    /// A live view of the words up to `to`.
    fn head_set<'a>(&'a self, to: &str, inclusive: bool) -> SubSet<'a, Self> {
        SubSet {
            dawg: self,
            prefix: String::new(),
            descending: false,
            from: None,
            incl_from: false,
            to: Some(to.to_string()),
            incl_to: inclusive,
        }
    }

    /// A live view of the words from `from` on.
    fn tail_set<'a>(&'a self, from: &str, inclusive: bool) -> SubSet<'a, Self> {
        let from = (!(inclusive && from.is_empty())).then(|| from.to_string());
        SubSet {
            dawg: self,
            prefix: String::new(),
            descending: false,
            from,
            incl_from: inclusive,
            to: None,
            incl_to: false,
        }
    }

    /// A live view of the words starting with `prefix`.
    fn prefix_set<'a>(&'a self, prefix: &str) -> SubSet<'a, Self> {
        SubSet {
            dawg: self,
            prefix: prefix.to_string(),
            descending: false,
            from: None,
            incl_from: false,
            to: None,
            incl_to: false,
        }
    }

    /// A live reverse-ordered view of the whole set.
    fn descending_set(&self) -> SubSet<'_, Self> {
        SubSet {
            dawg: self,
            prefix: String::new(),
            descending: true,
            from: None,
            incl_from: false,
            to: None,
            incl_to: false,
        }
    }
}

/// A live, range-restricted view over a backing automaton.
///
/// The view stores only its bounds and delegates every call back to the
/// backing set, so mutations through the owner are visible on the next
/// read. All navigation honors the view's own direction.
pub struct SubSet<'a, D: DawgSet> {
    dawg: &'a D,
    prefix: String,
    descending: bool,
    from: Option<String>,
    incl_from: bool,
    to: Option<String>,
    incl_to: bool,
}

impl<'a, D: DawgSet> SubSet<'a, D> {
    fn query(&self, descending: bool) -> Query {
        let mut query = Query::new()
            .starting_with(&self.prefix)
            .descending(descending);
        if let Some(from) = &self.from {
            query = query.from(from, self.incl_from);
        }
        if let Some(to) = &self.to {
            query = query.to(to, self.incl_to);
        }
        query
    }

    /// The greatest backing word `<= word` (or `< word` when not
    /// inclusive), clamped to the view's upper bound.
    fn abs_lower(&self, word: &str, inclusive: bool) -> Option<String> {
        let mut query = self.query(true);
        let (to, incl_to) = match &self.to {
            Some(to) => match letters::cmp(word, to) {
                Ordering::Greater => (to.as_str(), self.incl_to),
                Ordering::Less => (word, inclusive),
                Ordering::Equal => (word, inclusive && self.incl_to),
            },
            None => (word, inclusive),
        };
        query = query.to(to, incl_to);
        self.dawg.search(query).next()
    }

    /// The least backing word `>= word`, clamped to the lower bound.
    fn abs_higher(&self, word: &str, inclusive: bool) -> Option<String> {
        let mut query = self.query(false);
        let (from, incl_from) = match &self.from {
            Some(from) => match letters::cmp(word, from) {
                Ordering::Less => (from.as_str(), self.incl_from),
                Ordering::Greater => (word, inclusive),
                Ordering::Equal => (word, inclusive && self.incl_from),
            },
            None => (word, inclusive),
        };
        query = query.from(from, incl_from);
        self.dawg.search(query).next()
    }

    /// The greatest element of the view strictly below `word` (in the
    /// view's own order).
    pub fn lower(&self, word: &str) -> Option<String> {
        if self.descending {
            self.abs_higher(word, false)
        } else {
            self.abs_lower(word, false)
        }
    }

    /// The greatest element of the view at or below `word`.
    pub fn floor(&self, word: &str) -> Option<String> {
        if self.descending {
            self.abs_higher(word, true)
        } else {
            self.abs_lower(word, true)
        }
    }

    /// The least element of the view at or above `word`.
    pub fn ceiling(&self, word: &str) -> Option<String> {
        if self.descending {
            self.abs_lower(word, true)
        } else {
            self.abs_higher(word, true)
        }
    }

    /// The least element of the view strictly above `word`.
    pub fn higher(&self, word: &str) -> Option<String> {
        if self.descending {
            self.abs_lower(word, false)
        } else {
            self.abs_higher(word, false)
        }
    }

    /// The first element in the view's order.
    pub fn first(&self) -> Option<String> {
        self.dawg.search(self.query(self.descending)).next()
    }

    /// The last element in the view's order.
    pub fn last(&self) -> Option<String> {
        self.dawg.search(self.query(!self.descending)).next()
    }

    /// Iterates the view in its own order.
    pub fn iter(&self) -> Strings<'a, D> {
        self.dawg.search(self.query(self.descending))
    }

    /// Iterates the view in the reverse of its own order.
    pub fn descending_iter(&self) -> Strings<'a, D> {
        self.dawg.search(self.query(!self.descending))
    }

    /// The number of words currently in range. Counts by iteration.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True if no stored word lies in range.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Whether `word` is stored and lies in range.
    pub fn contains(&self, word: &str) -> bool {
        self.in_range(word, true) && self.dawg.contains(word)
    }

    /// Whether `word` lies within the view's bounds. With
    /// `strict = false` the check treats both bounds as inclusive, the
    /// way exclusive endpoints of derived views are validated.
    pub fn in_range(&self, word: &str, strict: bool) -> bool {
        if !word.starts_with(&self.prefix) {
            return false;
        }
        if let Some(from) = &self.from {
            match letters::cmp(word, from) {
                Ordering::Less => return false,
                Ordering::Equal if strict && !self.incl_from => return false,
                _ => {}
            }
        }
        if let Some(to) = &self.to {
            match letters::cmp(word, to) {
                Ordering::Greater => return false,
                Ordering::Equal if strict && !self.incl_to => return false,
                _ => {}
            }
        }
        true
    }

    /// The reverse-ordered twin of this view.
    pub fn descending_set(&self) -> SubSet<'a, D> {
        SubSet {
            dawg: self.dawg,
            prefix: self.prefix.clone(),
            descending: !self.descending,
            from: self.from.clone(),
            incl_from: self.incl_from,
            to: self.to.clone(),
            incl_to: self.incl_to,
        }
    }

    /// A nested range view; both endpoints must lie in this view's range.
    pub fn sub_set(
        &self,
        from: &str,
        incl_from: bool,
        to: &str,
        incl_to: bool,
    ) -> Result<SubSet<'a, D>> {
        if !self.in_range(from, incl_from) || !self.in_range(to, incl_to) {
            return Err(DawgError::OutOfRange);
        }
        let from = (!(incl_from && from.is_empty())).then(|| from.to_string());
        Ok(SubSet {
            dawg: self.dawg,
            prefix: self.prefix.clone(),
            descending: self.descending,
            from,
            incl_from,
            to: Some(to.to_string()),
            incl_to,
        })
    }

    /// A nested view bounded above; `to` must lie in range.
    pub fn head_set(&self, to: &str, inclusive: bool) -> Result<SubSet<'a, D>> {
        if !self.in_range(to, inclusive) {
            return Err(DawgError::OutOfRange);
        }
        Ok(SubSet {
            dawg: self.dawg,
            prefix: self.prefix.clone(),
            descending: self.descending,
            from: self.from.clone(),
            incl_from: self.incl_from,
            to: Some(to.to_string()),
            incl_to: inclusive,
        })
    }

    /// A nested view bounded below; `from` must lie in range.
    pub fn tail_set(&self, from: &str, inclusive: bool) -> Result<SubSet<'a, D>> {
        if !self.in_range(from, inclusive) {
            return Err(DawgError::OutOfRange);
        }
        let from = (!(inclusive && from.is_empty())).then(|| from.to_string());
        Ok(SubSet {
            dawg: self.dawg,
            prefix: self.prefix.clone(),
            descending: self.descending,
            from,
            incl_from: inclusive,
            to: self.to.clone(),
            incl_to: self.incl_to,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dawg::builder::MutableDawg;

    fn sample() -> MutableDawg {
        let mut dawg = MutableDawg::new();
        dawg.add_all(["b", "ba", "bac", "bad", "c", "ca", "d"]);
        dawg
    }

    #[test]
    fn navigation_on_both_representations() {
        let dawg = sample();
        let compact = dawg.compress();

        assert_eq!(dawg.first().as_deref(), Some("b"));
        assert_eq!(dawg.last().as_deref(), Some("d"));
        assert_eq!(compact.first().as_deref(), Some("b"));
        assert_eq!(compact.last().as_deref(), Some("d"));

        for set_lower in [dawg.lower("bac"), compact.lower("bac")] {
            assert_eq!(set_lower.as_deref(), Some("ba"));
        }
        assert_eq!(dawg.lower("b"), None);
        assert_eq!(dawg.floor("bac").as_deref(), Some("bac"));
        assert_eq!(dawg.floor("bb").as_deref(), Some("bad"));
        assert_eq!(dawg.ceiling("bac").as_deref(), Some("bac"));
        assert_eq!(dawg.ceiling("bb").as_deref(), Some("c"));
        assert_eq!(dawg.higher("bac").as_deref(), Some("bad"));
        assert_eq!(dawg.higher("d"), None);
        assert_eq!(compact.higher("bad").as_deref(), Some("c"));
    }

    #[test]
    fn sub_set_slices_and_rejects_inverted_bounds() {
        let dawg = sample();
        let view = dawg.sub_set("ba", true, "c", false).unwrap();
        let words: Vec<String> = view.iter().collect();
        assert_eq!(words, ["ba", "bac", "bad"]);
        assert_eq!(view.len(), 3);
        assert!(view.contains("bac"));
        assert!(!view.contains("c"));
        assert!(!view.contains("a"));

        assert!(matches!(
            dawg.sub_set("c", true, "b", true),
            Err(DawgError::OutOfRange)
        ));
    }

    #[test]
    fn head_and_tail_views() {
        let dawg = sample();
        let head: Vec<String> = dawg.head_set("bac", true).iter().collect();
        assert_eq!(head, ["b", "ba", "bac"]);
        let head: Vec<String> = dawg.head_set("bac", false).iter().collect();
        assert_eq!(head, ["b", "ba"]);
        let tail: Vec<String> = dawg.tail_set("c", true).iter().collect();
        assert_eq!(tail, ["c", "ca", "d"]);
        let tail: Vec<String> = dawg.tail_set("c", false).iter().collect();
        assert_eq!(tail, ["ca", "d"]);
    }

    #[test]
    fn prefix_view_delegates_to_the_engine() {
        let dawg = sample();
        let view = dawg.prefix_set("ba");
        let words: Vec<String> = view.iter().collect();
        assert_eq!(words, ["ba", "bac", "bad"]);
        assert_eq!(view.first().as_deref(), Some("ba"));
        assert_eq!(view.last().as_deref(), Some("bad"));
        assert!(!view.contains("b"));
    }

    #[test]
    fn descending_views_flip_every_operation() {
        let dawg = sample();
        let view = dawg.descending_set();
        let words: Vec<String> = view.iter().collect();
        assert_eq!(words, ["d", "ca", "c", "bad", "bac", "ba", "b"]);
        assert_eq!(view.first().as_deref(), Some("d"));
        assert_eq!(view.last().as_deref(), Some("b"));
        // In the view's order, "lower" walks toward larger words.
        assert_eq!(view.lower("c").as_deref(), Some("ca"));
        assert_eq!(view.higher("c").as_deref(), Some("bad"));
        assert_eq!(view.floor("c").as_deref(), Some("c"));
        assert_eq!(view.ceiling("c").as_deref(), Some("c"));

        let twice = view.descending_set();
        let words: Vec<String> = twice.iter().collect();
        assert_eq!(words.first().map(String::as_str), Some("b"));
    }

    #[test]
    fn nested_views_validate_their_bounds() {
        let dawg = sample();
        let view = dawg.sub_set("b", true, "ca", true).unwrap();
        let narrower = view.sub_set("ba", true, "c", true).unwrap();
        let words: Vec<String> = narrower.iter().collect();
        assert_eq!(words, ["ba", "bac", "bad", "c"]);

        assert!(matches!(
            view.sub_set("a", true, "c", true),
            Err(DawgError::OutOfRange)
        ));
        assert!(matches!(
            view.head_set("d", true),
            Err(DawgError::OutOfRange)
        ));
        assert!(matches!(
            view.tail_set("cb", true),
            Err(DawgError::OutOfRange)
        ));
        let tail = view.tail_set("ba", false).unwrap();
        let words: Vec<String> = tail.iter().collect();
        assert_eq!(words, ["bac", "bad", "c", "ca"]);
    }

    #[test]
    fn views_are_live() {
        let mut dawg = sample();
        {
            let view = dawg.prefix_set("ba");
            assert_eq!(view.len(), 3);
        }
        dawg.add("bab");
        dawg.remove("bac");
        let view = dawg.prefix_set("ba");
        let words: Vec<String> = view.iter().collect();
        assert_eq!(words, ["ba", "bab", "bad"]);
    }

    #[test]
    fn empty_bounds_normalize_to_unbounded() {
        let dawg = sample();
        let all: Vec<String> = dawg.tail_set("", true).iter().collect();
        assert_eq!(all.len(), 7);
        let sub: Vec<String> = dawg.sub_set("", true, "z", false).unwrap().iter().collect();
        assert_eq!(sub.len(), 7);
    }
}
