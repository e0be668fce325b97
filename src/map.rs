//! Map and multi-map facades over a word graph.
//!
//! A pair `(key, value)` is stored in the underlying set as the single
//! string `key NUL value`. The NUL code unit is reserved for this
//! encoding, so keys and values must not contain it; everything else
//! (ordered key navigation, prefix queries, compression) falls out of
//! the set operations directly.

use crate::dawg::builder::MutableDawg;
use crate::dawg::compact::CompactDawg;
use crate::dawg::set::DawgSet;
use crate::error::{DawgError, Result};

/// The reserved key/value separator.
const SEPARATOR: char = '\0';

/// The separator's successor, used to probe past a key's entry block:
/// every entry of `key` sorts below `key` followed by `0x0001`, and
/// every entry of a later key sorts above it.
const SEPARATOR_SUCCESSOR: char = '\u{1}';

fn check(s: &str) -> Result<()> {
    if s.contains(SEPARATOR) {
        Err(DawgError::InvalidInput)
    } else {
        Ok(())
    }
}

fn join(key: &str, value: &str) -> String {
    let mut entry = String::with_capacity(key.len() + value.len() + 1);
    entry.push_str(key);
    entry.push(SEPARATOR);
    entry.push_str(value);
    entry
}

fn split_entry(entry: String) -> (String, String) {
    match entry.split_once(SEPARATOR) {
        Some((key, value)) => (key.to_string(), value.to_string()),
        None => (entry, String::new()),
    }
}

fn key_part(entry: String) -> String {
    split_entry(entry).0
}

fn ceiling_key<D: DawgSet>(set: &D, key: &str) -> Option<String> {
    set.ceiling(&format!("{key}{SEPARATOR}")).map(key_part)
}

fn higher_key<D: DawgSet>(set: &D, key: &str) -> Option<String> {
    set.ceiling(&format!("{key}{SEPARATOR_SUCCESSOR}")).map(key_part)
}

fn lower_key<D: DawgSet>(set: &D, key: &str) -> Option<String> {
    set.lower(&format!("{key}{SEPARATOR}")).map(key_part)
}

fn floor_key<D: DawgSet>(set: &D, key: &str) -> Option<String> {
    set.lower(&format!("{key}{SEPARATOR_SUCCESSOR}")).map(key_part)
}

/// An ordered string-to-string map backed by a word graph.
///
/// One value per key. The compact variant
/// [`CompactDawgMap`] shares every read operation through the same
/// generic implementation.
///
/// # Examples
///
/// ```
/// use dawgset::map::DawgMap;
///
/// let mut map = DawgMap::new();
/// map.put("a", "b").unwrap();
/// map.put("d", "ed").unwrap();
/// assert_eq!(map.get("a").unwrap().as_deref(), Some("b"));
/// map.put("a", "c").unwrap();
/// assert_eq!(map.get("a").unwrap().as_deref(), Some("c"));
/// ```
#[derive(Debug)]
pub struct DawgMap<D: DawgSet = MutableDawg> {
    set: D,
}

/// A [`DawgMap`] over the compact representation; read-only.
pub type CompactDawgMap = DawgMap<CompactDawg>;

impl<D: DawgSet> DawgMap<D> {
    /// The number of stored entries.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// True if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Whether `key` has a value.
    pub fn contains_key(&self, key: &str) -> Result<bool> {
        check(key)?;
        Ok(self
            .set
            .strings_starting_with(&format!("{key}{SEPARATOR}"))
            .next()
            .is_some())
    }

    /// Whether any key maps to `value`.
    pub fn contains_value(&self, value: &str) -> Result<bool> {
        check(value)?;
        Ok(self
            .set
            .strings_ending_with(&format!("{SEPARATOR}{value}"))
            .next()
            .is_some())
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        check(key)?;
        Ok(self
            .set
            .strings_starting_with(&format!("{key}{SEPARATOR}"))
            .next()
            .map(|entry| entry[key.len() + 1..].to_string()))
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.set.iter().map(split_entry)
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.set.iter().map(key_part)
    }

    /// Values in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = String> + '_ {
        self.set.iter().map(|entry| split_entry(entry).1)
    }

    /// The smallest key.
    pub fn first_key(&self) -> Option<String> {
        self.set.first().map(key_part)
    }

    /// The largest key.
    pub fn last_key(&self) -> Option<String> {
        self.set.last().map(key_part)
    }

    /// The largest key strictly below `key`.
    pub fn lower_key(&self, key: &str) -> Result<Option<String>> {
        check(key)?;
        Ok(lower_key(&self.set, key))
    }

    /// The largest key at or below `key`.
    pub fn floor_key(&self, key: &str) -> Result<Option<String>> {
        check(key)?;
        Ok(floor_key(&self.set, key))
    }

    /// The smallest key at or above `key`.
    pub fn ceiling_key(&self, key: &str) -> Result<Option<String>> {
        check(key)?;
        Ok(ceiling_key(&self.set, key))
    }

    /// The smallest key strictly above `key`.
    pub fn higher_key(&self, key: &str) -> Result<Option<String>> {
        check(key)?;
        Ok(higher_key(&self.set, key))
    }
}

impl DawgMap<MutableDawg> {
    /// Creates an empty map.
    pub fn new() -> Self {
        DawgMap {
            set: MutableDawg::new(),
        }
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn put(&mut self, key: &str, value: &str) -> Result<Option<String>> {
        check(key)?;
        check(value)?;
        let old = self.get(key)?;
        if old.as_deref() == Some(value) {
            return Ok(old);
        }
        self.set.add(&join(key, value));
        if let Some(old_value) = &old {
            self.set.remove(&join(key, old_value));
        }
        Ok(old)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Result<Option<String>> {
        let old = self.get(key)?;
        if let Some(old_value) = &old {
            self.set.remove(&join(key, old_value));
        }
        Ok(old)
    }

    /// Stores every pair of an iterator.
    pub fn put_all<I, K, V>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in pairs {
            self.put(key.as_ref(), value.as_ref())?;
        }
        Ok(())
    }

    /// Drops alphabet letters orphaned by removals; see
    /// [`MutableDawg::optimize_letters`].
    pub fn optimize_letters(&mut self) {
        self.set.optimize_letters();
    }

    /// Projects the map onto the compact representation.
    pub fn compress(&self) -> CompactDawgMap {
        DawgMap {
            set: self.set.compress(),
        }
    }
}

impl Default for DawgMap<MutableDawg> {
    fn default() -> Self {
        DawgMap::new()
    }
}

impl DawgMap<CompactDawg> {
    /// Materializes the map back into its mutable form.
    pub fn uncompress(&self) -> DawgMap<MutableDawg> {
        DawgMap {
            set: self.set.uncompress(),
        }
    }
}

impl<D: DawgSet + PartialEq> PartialEq for DawgMap<D> {
    fn eq(&self, other: &Self) -> bool {
        self.set == other.set
    }
}

impl<D: DawgSet + Eq> Eq for DawgMap<D> {}

impl<D: DawgSet + std::hash::Hash> std::hash::Hash for DawgMap<D> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.set.hash(state);
    }
}

/// An ordered string-to-string-set map backed by a word graph.
///
/// Every key maps to the set of values stored under it; values of one
/// key iterate in ascending order.
#[derive(Debug)]
pub struct DawgMultiMap<D: DawgSet = MutableDawg> {
    set: D,
}

/// A [`DawgMultiMap`] over the compact representation; read-only.
pub type CompactDawgMultiMap = DawgMultiMap<CompactDawg>;

/// A live view of one key's values; reads through to the backing set.
pub struct Values<'a, D: DawgSet> {
    set: &'a D,
    prefix: String,
}

impl<D: DawgSet> Values<'_, D> {
    /// The values in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = String> + '_ {
        let skip = self.prefix.len();
        self.set
            .strings_starting_with(&self.prefix)
            .map(move |entry| entry[skip..].to_string())
    }

    /// The number of values currently stored.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True if the key currently has no values.
    pub fn is_empty(&self) -> bool {
        self.set.strings_starting_with(&self.prefix).next().is_none()
    }

    /// Whether `value` is among the values.
    pub fn contains(&self, value: &str) -> Result<bool> {
        check(value)?;
        Ok(self.set.contains(&format!("{}{value}", self.prefix)))
    }
}

impl<D: DawgSet> DawgMultiMap<D> {
    /// The number of stored pairs, values counted individually.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// True if no pairs are stored.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Whether `key` has at least one value.
    pub fn contains_key(&self, key: &str) -> Result<bool> {
        check(key)?;
        Ok(self
            .set
            .strings_starting_with(&format!("{key}{SEPARATOR}"))
            .next()
            .is_some())
    }

    /// A live view of `key`'s values.
    pub fn get(&self, key: &str) -> Result<Values<'_, D>> {
        check(key)?;
        Ok(Values {
            set: &self.set,
            prefix: format!("{key}{SEPARATOR}"),
        })
    }

    /// All pairs, ascending by key and then by value.
    pub fn iter(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.set.iter().map(split_entry)
    }

    /// Distinct keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        let mut previous: Option<String> = None;
        self.set.iter().filter_map(move |entry| {
            let key = key_part(entry);
            if previous.as_deref() == Some(&key) {
                None
            } else {
                previous = Some(key.clone());
                Some(key)
            }
        })
    }

    /// The smallest key.
    pub fn first_key(&self) -> Option<String> {
        self.set.first().map(key_part)
    }

    /// The largest key.
    pub fn last_key(&self) -> Option<String> {
        self.set.last().map(key_part)
    }

    /// The largest key strictly below `key`.
    pub fn lower_key(&self, key: &str) -> Result<Option<String>> {
        check(key)?;
        Ok(lower_key(&self.set, key))
    }

    /// The largest key at or below `key`.
    pub fn floor_key(&self, key: &str) -> Result<Option<String>> {
        check(key)?;
        Ok(floor_key(&self.set, key))
    }

    /// The smallest key at or above `key`.
    pub fn ceiling_key(&self, key: &str) -> Result<Option<String>> {
        check(key)?;
        Ok(ceiling_key(&self.set, key))
    }

    /// The smallest key strictly above `key`.
    pub fn higher_key(&self, key: &str) -> Result<Option<String>> {
        check(key)?;
        Ok(higher_key(&self.set, key))
    }
}

impl DawgMultiMap<MutableDawg> {
    /// Creates an empty multi-map.
    pub fn new() -> Self {
        DawgMultiMap {
            set: MutableDawg::new(),
        }
    }

    /// Adds `value` under `key`. Returns true if the pair is new.
    pub fn put(&mut self, key: &str, value: &str) -> Result<bool> {
        check(key)?;
        check(value)?;
        Ok(self.set.add(&join(key, value)))
    }

    /// Adds every value of an iterator under `key`.
    pub fn put_all<I, V>(&mut self, key: &str, values: I) -> Result<bool>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        check(key)?;
        let mut changed = false;
        for value in values {
            changed |= self.put(key, value.as_ref())?;
        }
        Ok(changed)
    }

    /// Removes one pair. Returns true if it was stored.
    pub fn remove(&mut self, key: &str, value: &str) -> Result<bool> {
        check(key)?;
        check(value)?;
        Ok(self.set.remove(&join(key, value)))
    }

    /// Removes `key` with all its values, returning them.
    pub fn remove_key(&mut self, key: &str) -> Result<Vec<String>> {
        let values: Vec<String> = self.get(key)?.iter().collect();
        for value in &values {
            self.set.remove(&join(key, value));
        }
        Ok(values)
    }

    /// Projects the multi-map onto the compact representation.
    pub fn compress(&self) -> CompactDawgMultiMap {
        DawgMultiMap {
            set: self.set.compress(),
        }
    }
}

impl Default for DawgMultiMap<MutableDawg> {
    fn default() -> Self {
        DawgMultiMap::new()
    }
}

impl DawgMultiMap<CompactDawg> {
    /// Materializes the multi-map back into its mutable form.
    pub fn uncompress(&self) -> DawgMultiMap<MutableDawg> {
        DawgMultiMap {
            set: self.set.uncompress(),
        }
    }
}

impl<D: DawgSet + PartialEq> PartialEq for DawgMultiMap<D> {
    fn eq(&self, other: &Self) -> bool {
        self.set == other.set
    }
}

impl<D: DawgSet + Eq> Eq for DawgMultiMap<D> {}

impl<D: DawgSet + std::hash::Hash> std::hash::Hash for DawgMultiMap<D> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.set.hash(state);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn put_get_replace() {
        let mut map = DawgMap::new();
        assert_eq!(map.put("a", "b").unwrap(), None);
        assert_eq!(map.get("a").unwrap().as_deref(), Some("b"));
        map.put("d", "ed").unwrap();
        assert_eq!(map.get("d").unwrap().as_deref(), Some("ed"));
        assert_eq!(map.put("a", "c").unwrap().as_deref(), Some("b"));
        assert_eq!(map.get("a").unwrap().as_deref(), Some("c"));
        assert_eq!(map.len(), 2);

        map.optimize_letters();
        let compact = map.compress();
        assert_eq!(compact.get("d").unwrap().as_deref(), Some("ed"));
        assert_eq!(compact.get("a").unwrap().as_deref(), Some("c"));
        assert_eq!(compact, compact.uncompress().compress());
    }

    #[test]
    fn separator_is_rejected() {
        let mut map = DawgMap::new();
        assert!(matches!(
            map.put("a\0b", "c"),
            Err(DawgError::InvalidInput)
        ));
        assert!(matches!(
            map.put("a", "c\0b"),
            Err(DawgError::InvalidInput)
        ));
        assert!(matches!(map.get("a\0"), Err(DawgError::InvalidInput)));
        let multi = DawgMultiMap::new();
        assert!(matches!(multi.get("\0"), Err(DawgError::InvalidInput)));
    }

    #[test]
    fn remove_and_contains() {
        let mut map = DawgMap::new();
        map.put("one", "1").unwrap();
        map.put("two", "2").unwrap();
        assert!(map.contains_key("one").unwrap());
        assert!(map.contains_value("2").unwrap());
        assert!(!map.contains_value("3").unwrap());
        assert_eq!(map.remove("one").unwrap().as_deref(), Some("1"));
        assert_eq!(map.remove("one").unwrap(), None);
        assert!(!map.contains_key("one").unwrap());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn empty_values_round_trip() {
        let mut map = DawgMap::new();
        map.put("k", "").unwrap();
        assert_eq!(map.get("k").unwrap().as_deref(), Some(""));
        assert!(map.contains_value("").unwrap());
    }

    #[test]
    fn key_navigation() {
        let mut map = DawgMap::new();
        map.put_all([("b", "1"), ("d", "2"), ("f", "3")]).unwrap();

        assert_eq!(map.first_key().as_deref(), Some("b"));
        assert_eq!(map.last_key().as_deref(), Some("f"));
        assert_eq!(map.ceiling_key("d").unwrap().as_deref(), Some("d"));
        assert_eq!(map.ceiling_key("c").unwrap().as_deref(), Some("d"));
        assert_eq!(map.higher_key("d").unwrap().as_deref(), Some("f"));
        assert_eq!(map.higher_key("f").unwrap(), None);
        assert_eq!(map.floor_key("d").unwrap().as_deref(), Some("d"));
        assert_eq!(map.floor_key("c").unwrap().as_deref(), Some("b"));
        assert_eq!(map.lower_key("d").unwrap().as_deref(), Some("b"));
        assert_eq!(map.lower_key("b").unwrap(), None);
    }

    #[test]
    fn key_navigation_with_prefixed_keys() {
        let mut map = DawgMap::new();
        map.put_all([("a", "x"), ("ab", "y"), ("abc", "z")]).unwrap();

        // A key's entries must not satisfy its own higher/lower probes.
        assert_eq!(map.higher_key("a").unwrap().as_deref(), Some("ab"));
        assert_eq!(map.higher_key("ab").unwrap().as_deref(), Some("abc"));
        assert_eq!(map.lower_key("ab").unwrap().as_deref(), Some("a"));
        assert_eq!(map.lower_key("abc").unwrap().as_deref(), Some("ab"));
        assert_eq!(map.floor_key("ab").unwrap().as_deref(), Some("ab"));
        assert_eq!(map.ceiling_key("ab").unwrap().as_deref(), Some("ab"));
    }

    #[test]
    fn entry_iteration() {
        let mut map = DawgMap::new();
        map.put_all([("b", "2"), ("a", "1"), ("c", "3")]).unwrap();
        let entries: Vec<(String, String)> = map.iter().collect();
        assert_eq!(
            entries,
            [
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("c".to_string(), "3".to_string()),
            ]
        );
        let keys: Vec<String> = map.keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
        let values: Vec<String> = map.values().collect();
        assert_eq!(values, ["1", "2", "3"]);
    }

    #[test]
    fn multi_map_grouping() {
        let mut map = DawgMultiMap::new();
        map.put_all("a", ["0", "1", "2"]).unwrap();
        map.put_all("b", ["3", "4", "5"]).unwrap();
        assert_eq!(map.len(), 6);
        assert_eq!(map.get("a").unwrap().len(), 3);
        assert_eq!(map.get("b").unwrap().len(), 3);
        assert!(map.get("c").unwrap().is_empty());
        let a_values: Vec<String> = map.get("a").unwrap().iter().collect();
        assert_eq!(a_values, ["0", "1", "2"]);
        let keys: Vec<String> = map.keys().collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn multi_map_value_view_is_live() {
        let mut map = DawgMultiMap::new();
        map.put("k", "1").unwrap();
        map.put("k", "2").unwrap();
        map.remove("k", "1").unwrap();
        let values = map.get("k").unwrap();
        assert_eq!(values.len(), 1);
        assert!(values.contains("2").unwrap());
        assert!(!values.contains("1").unwrap());
    }

    #[test]
    fn multi_map_remove_key() {
        let mut map = DawgMultiMap::new();
        map.put_all("a", ["1", "2"]).unwrap();
        map.put("b", "3").unwrap();
        let removed = map.remove_key("a").unwrap();
        assert_eq!(removed, ["1", "2"]);
        assert!(!map.contains_key("a").unwrap());
        assert!(map.contains_key("b").unwrap());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn multi_map_compress_round_trip() {
        let mut map = DawgMultiMap::new();
        map.put_all("verb", ["run", "ran"]).unwrap();
        map.put("noun", "runner").unwrap();
        let compact = map.compress();
        assert_eq!(compact.len(), 3);
        let values: Vec<String> = compact.get("verb").unwrap().iter().collect();
        assert_eq!(values, ["ran", "run"]);
        assert_eq!(compact, compact.uncompress().compress());
    }
}
