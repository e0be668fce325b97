//! The compact read-only representation: the whole automaton in one
//! flat integer array.
//!
//! Each transition becomes a fixed-width record of `2 + ⌈|Σ|/32⌉` u32
//! words: packed label and accept flag, the begin index of the target
//! node's own child block, and a bitmap of the target's outgoing labels
//! over the alphabet table (its popcount is the block length). A node's
//! block is a contiguous run of records in ascending label order. The
//! trailing sentinel record doubles as the source node's record, which
//! keeps every derived field recomputable from the serialized form.

use std::hash::{Hash, Hasher};
use std::io::{Read, Write};
use std::sync::OnceLock;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::error::{DawgError, Result};

use super::arena::NodeArena;
use super::builder::MutableDawg;
use super::letters::Letter;
use super::node::NodeId;
use super::search::Automaton;
use super::set::DawgSet;

/// Handle to a state of a [`CompactDawg`]: an index into its record
/// array.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CompactNodeId(u32);

/// An immutable string set backed by a flat integer array.
///
/// Derived from a [`MutableDawg`] via
/// [`compress`](MutableDawg::compress); structurally immutable after
/// construction and freely shareable between readers. To mutate,
/// [`uncompress`](CompactDawg::uncompress) back into a builder.
///
/// # Examples
///
/// ```
/// use dawgset::{DawgSet, MutableDawg};
///
/// let mut dawg = MutableDawg::new();
/// dawg.add_all(["a", "xe", "xes", "xs"]);
/// let compact = dawg.compress();
/// assert!(compact.contains("xes"));
/// assert_eq!(compact.len(), 4);
/// let all: Vec<String> = compact.iter().collect();
/// assert_eq!(all, ["a", "xe", "xes", "xs"]);
/// ```
#[derive(Clone)]
pub struct CompactDawg {
    data: Vec<u32>,
    letters: Vec<Letter>,
    with_incoming: bool,
    size: OnceLock<usize>,
    max_length: OnceLock<usize>,
}

const ACCEPT_BIT: u32 = 1 << 16;

fn record_width(alphabet_len: usize) -> usize {
    2 + (alphabet_len + 31) / 32
}

fn pack_word0(letter: Letter, accept: bool) -> u32 {
    letter as u32 | if accept { ACCEPT_BIT } else { 0 }
}

fn write_bitmap(bits: &mut [u32], letters: &[Letter], edges: &[(Letter, NodeId)]) {
    for &(letter, _) in edges {
        let index = letters
            .binary_search(&letter)
            .expect("edge label missing from alphabet table");
        bits[index / 32] |= 1 << (index % 32);
    }
}

/// Lays out a minimal mutable graph into its compact form.
///
/// Depth-first in ascending label order, so the layout is a function of
/// the graph's structure alone.
pub(crate) fn compress_graph(dawg: &MutableDawg) -> CompactDawg {
    let letters: Vec<Letter> = dawg.letter_table().iter().copied().collect();
    let width = record_width(letters.len());
    let records = dawg.transition_count() + 1;
    let mut data = vec![0u32; records * width];
    let mut positions: HashMap<NodeId, u32> = HashMap::new();
    let mut next_free = 0u32;
    layout(
        dawg.arena(),
        &letters,
        width,
        &mut data,
        &mut positions,
        NodeId::SOURCE,
        &mut next_free,
    );
    debug_assert_eq!(next_free as usize, dawg.transition_count());

    // The sentinel record carries the source node itself.
    let sentinel = (records - 1) * width;
    let source = dawg.arena().node(NodeId::SOURCE);
    data[sentinel] = pack_word0(0, source.is_accept());
    data[sentinel + 1] = 0;
    write_bitmap(&mut data[sentinel + 2..sentinel + width], &letters, source.edges());

    let compact = CompactDawg {
        data,
        letters,
        with_incoming: dawg.is_with_incoming_transitions(),
        size: OnceLock::new(),
        max_length: OnceLock::new(),
    };
    let _ = compact.size.set(dawg.len());
    let _ = compact.max_length.set(dawg.max_word_length());
    compact
}

/// Reserves `node`'s child block, then writes one record per child,
/// recursing into children whose own blocks are not laid out yet.
fn layout(
    arena: &NodeArena,
    letters: &[Letter],
    width: usize,
    data: &mut [u32],
    positions: &mut HashMap<NodeId, u32>,
    node: NodeId,
    next_free: &mut u32,
) {
    let begin = *next_free;
    positions.insert(node, begin);
    *next_free += arena.node(node).out_degree() as u32;

    let edges: SmallVec<[(Letter, NodeId); 8]> =
        arena.node(node).edges().iter().copied().collect();
    let mut pivot = begin as usize;
    for (letter, child) in edges {
        let base = pivot * width;
        data[base] = pack_word0(letter, arena.node(child).is_accept());
        write_bitmap(&mut data[base + 2..base + width], letters, arena.node(child).edges());
        if !positions.contains_key(&child) {
            layout(arena, letters, width, data, positions, child, next_free);
        }
        data[base + 1] = positions[&child];
        pivot += 1;
    }
}

impl CompactDawg {
    #[inline]
    fn width(&self) -> usize {
        record_width(self.letters.len())
    }

    #[inline]
    fn record_count(&self) -> usize {
        self.data.len() / self.width()
    }

    #[inline]
    fn word0(&self, record: usize) -> u32 {
        self.data[record * self.width()]
    }

    #[inline]
    fn label(&self, record: usize) -> Letter {
        (self.word0(record) & 0xFFFF) as Letter
    }

    #[inline]
    fn block_begin(&self, record: usize) -> u32 {
        self.data[record * self.width() + 1]
    }

    fn arity(&self, record: usize) -> u32 {
        let base = record * self.width() + 2;
        self.data[base..record * self.width() + self.width()]
            .iter()
            .map(|word| word.count_ones())
            .sum()
    }

    /// The ordered table of every transition label in the automaton.
    pub fn alphabet(&self) -> &[Letter] {
        &self.letters
    }

    /// Whether the originating builder maintained reverse edges. The
    /// flag is carried through serialization so that
    /// [`uncompress`](CompactDawg::uncompress) restores the same
    /// configuration; the compact form itself always answers suffix
    /// queries in forward mode.
    pub fn is_with_incoming_transitions(&self) -> bool {
        self.with_incoming
    }

    /// Materializes the automaton back into a builder by replaying its
    /// contents in ascending order.
    pub fn uncompress(&self) -> MutableDawg {
        let mut dawg = if self.with_incoming {
            MutableDawg::with_incoming_transitions()
        } else {
            MutableDawg::new()
        };
        dawg.add_all(self.iter());
        dawg
    }

    /// Serializes the automaton: the incoming-transition flag, the
    /// alphabet table, and the record array, all as little-endian u32
    /// words. Every other field is recomputed on load.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let mut put = |value: u32| writer.write_all(&value.to_le_bytes());
        put(self.with_incoming as u32)?;
        put(self.letters.len() as u32)?;
        for &letter in &self.letters {
            put(letter as u32)?;
        }
        put(self.data.len() as u32)?;
        for &word in &self.data {
            put(word)?;
        }
        Ok(())
    }

    /// Deserializes an automaton written by
    /// [`write_to`](CompactDawg::write_to).
    pub fn read_from<R: Read>(mut reader: R) -> Result<CompactDawg> {
        let mut get = || -> std::io::Result<u32> {
            let mut bytes = [0u8; 4];
            reader.read_exact(&mut bytes)?;
            Ok(u32::from_le_bytes(bytes))
        };
        let with_incoming = match get()? {
            0 => false,
            1 => true,
            _ => return Err(DawgError::Corrupt("invalid incoming-transition flag")),
        };
        let letter_count = get()? as usize;
        let mut letters = Vec::with_capacity(letter_count);
        for _ in 0..letter_count {
            let word = get()?;
            if word > u16::MAX as u32 {
                return Err(DawgError::Corrupt("alphabet entry out of range"));
            }
            letters.push(word as Letter);
        }
        if !letters.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(DawgError::Corrupt("alphabet table not strictly ascending"));
        }
        let data_len = get()? as usize;
        let mut data = Vec::with_capacity(data_len);
        for _ in 0..data_len {
            data.push(get()?);
        }
        let width = record_width(letters.len());
        if data.len() < width || data.len() % width != 0 {
            return Err(DawgError::Corrupt("record array length mismatch"));
        }
        let records = data.len() / width;
        for record in 0..records {
            let begin = data[record * width + 1] as usize;
            let arity = data[record * width + 2..(record + 1) * width]
                .iter()
                .map(|word| word.count_ones() as usize)
                .sum::<usize>();
            if arity > 0 && begin + arity > records - 1 {
                return Err(DawgError::Corrupt("child block out of bounds"));
            }
        }
        Ok(CompactDawg {
            data,
            letters,
            with_incoming,
            size: OnceLock::new(),
            max_length: OnceLock::new(),
        })
    }

    fn depth_below(&self, record: usize, memo: &mut HashMap<u32, usize>) -> usize {
        let arity = self.arity(record) as usize;
        if arity == 0 {
            return 0;
        }
        let begin = self.block_begin(record);
        if let Some(&depth) = memo.get(&begin) {
            return depth;
        }
        let mut deepest = 0;
        for child in begin as usize..begin as usize + arity {
            deepest = deepest.max(1 + self.depth_below(child, memo));
        }
        memo.insert(begin, deepest);
        deepest
    }
}

impl PartialEq for CompactDawg {
    fn eq(&self, other: &Self) -> bool {
        self.with_incoming == other.with_incoming
            && self.letters == other.letters
            && self.data == other.data
    }
}

impl Eq for CompactDawg {}

impl Hash for CompactDawg {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.with_incoming.hash(state);
        self.letters.hash(state);
        self.data.hash(state);
    }
}

impl std::fmt::Debug for CompactDawg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompactDawg")
            .field("alphabet_len", &self.letters.len())
            .field("transition_count", &(self.record_count() - 1))
            .finish()
    }
}

struct CompactEdges<'a> {
    dawg: &'a CompactDawg,
    begin: u32,
    end: u32,
    descending: bool,
}

impl Iterator for CompactEdges<'_> {
    type Item = (Letter, CompactNodeId);

    fn next(&mut self) -> Option<(Letter, CompactNodeId)> {
        if self.begin == self.end {
            return None;
        }
        let record = if self.descending {
            self.end -= 1;
            self.end
        } else {
            let record = self.begin;
            self.begin += 1;
            record
        };
        Some((self.dawg.label(record as usize), CompactNodeId(record)))
    }
}

impl Automaton for CompactDawg {
    type Node = CompactNodeId;

    fn source(&self) -> CompactNodeId {
        CompactNodeId((self.record_count() - 1) as u32)
    }

    fn is_accept(&self, node: CompactNodeId) -> bool {
        self.word0(node.0 as usize) & ACCEPT_BIT != 0
    }

    fn child(&self, node: CompactNodeId, letter: Letter) -> Option<CompactNodeId> {
        let begin = self.block_begin(node.0 as usize) as usize;
        let arity = self.arity(node.0 as usize) as usize;
        let mut low = 0;
        let mut high = arity;
        while low < high {
            let mid = (low + high) / 2;
            if self.label(begin + mid) < letter {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        (low < arity && self.label(begin + low) == letter)
            .then(|| CompactNodeId((begin + low) as u32))
    }

    fn outgoing_transitions(
        &self,
        node: CompactNodeId,
        descending: bool,
    ) -> impl Iterator<Item = (Letter, CompactNodeId)> + '_ {
        let begin = self.block_begin(node.0 as usize);
        let arity = self.arity(node.0 as usize);
        CompactEdges {
            dawg: self,
            begin,
            end: begin + arity,
            descending,
        }
    }

    fn incoming_transitions(
        &self,
        _node: CompactNodeId,
        _descending: bool,
    ) -> impl Iterator<Item = (Letter, CompactNodeId)> + '_ {
        std::iter::empty()
    }

    fn max_word_length(&self) -> usize {
        *self
            .max_length
            .get_or_init(|| self.depth_below(self.source().0 as usize, &mut HashMap::new()))
    }

    fn suffix_origins(&self, _suffix: &[Letter]) -> Option<Vec<CompactNodeId>> {
        None
    }
}

impl DawgSet for CompactDawg {
    fn len(&self) -> usize {
        *self.size.get_or_init(|| self.iter().count())
    }

    fn node_count(&self) -> usize {
        let mut begins = HashSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![self.source().0];
        while let Some(record) = stack.pop() {
            if !visited.insert(record) {
                continue;
            }
            let arity = self.arity(record as usize);
            if arity > 0 {
                let begin = self.block_begin(record as usize);
                begins.insert(begin);
                stack.extend(begin..begin + arity);
            }
        }
        // Every childless node collapses into one accept sink.
        begins.len() + 1
    }

    fn transition_count(&self) -> usize {
        self.record_count() - 1
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counts_match_the_builder() {
        let mut dawg = MutableDawg::new();
        dawg.add_all(["a", "xe", "xes", "xs"]);
        let compact = dawg.compress();

        assert_eq!(compact.len(), 4);
        assert_eq!(compact.node_count(), 4);
        assert_eq!(compact.transition_count(), 5);
        assert_eq!(compact.max_word_length(), 3);
        assert_eq!(compact.alphabet(), &[97u16, 101, 115, 120][..]);
    }

    #[test]
    fn enumeration_matches_the_builder() {
        let mut dawg = MutableDawg::new();
        dawg.add_all(["a", "xes", "xe", "xs"]);
        let compact = dawg.compress();

        let all: Vec<String> = compact.iter().collect();
        assert_eq!(all, ["a", "xe", "xes", "xs"]);
        let descending: Vec<String> = compact.descending_iter().collect();
        assert_eq!(descending, ["xs", "xes", "xe", "a"]);

        let xe: Vec<String> = compact.strings_starting_with("xe").collect();
        assert_eq!(xe, ["xe", "xes"]);
        let with_s: Vec<String> = compact.strings_ending_with("s").collect();
        assert_eq!(with_s, ["xes", "xs"]);

        assert!(compact.contains("xe"));
        assert!(!compact.contains("x"));
        assert!(!compact.contains("xesq"));
    }

    #[test]
    fn compression_is_deterministic() {
        let mut dawg = MutableDawg::new();
        dawg.add_all(["left", "lend", "lent"]);
        assert_eq!(dawg.compress(), dawg.compress());
    }

    #[test]
    fn uncompress_round_trips() {
        let mut dawg = MutableDawg::new();
        dawg.add_all(["", "add", "a", "ad"]);
        let compact = dawg.compress();
        let thawed = compact.uncompress();

        assert_eq!(thawed.len(), 4);
        let words: Vec<String> = thawed.iter().collect();
        assert_eq!(words, ["", "a", "ad", "add"]);
        assert_eq!(thawed.node_count(), dawg.node_count());
        assert_eq!(thawed.transition_count(), dawg.transition_count());
        assert_eq!(thawed.compress(), compact);
    }

    #[test]
    fn serialization_round_trips() {
        let mut dawg = MutableDawg::with_incoming_transitions();
        dawg.add_all(["bake", "baked", "cake", "caked"]);
        let compact = dawg.compress();

        let mut bytes = Vec::new();
        compact.write_to(&mut bytes).unwrap();
        let loaded = CompactDawg::read_from(bytes.as_slice()).unwrap();

        assert_eq!(loaded, compact);
        assert!(loaded.is_with_incoming_transitions());
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.max_word_length(), 5);
        let words: Vec<String> = loaded.iter().collect();
        assert_eq!(words, ["bake", "baked", "cake", "caked"]);

        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher as _;
        let mut h1 = DefaultHasher::new();
        let mut h2 = DefaultHasher::new();
        compact.hash(&mut h1);
        loaded.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn truncated_or_corrupt_data_is_rejected() {
        let mut dawg = MutableDawg::new();
        dawg.add_all(["ab", "ac"]);
        let mut bytes = Vec::new();
        dawg.compress().write_to(&mut bytes).unwrap();

        // Truncation surfaces as an I/O error.
        assert!(CompactDawg::read_from(&bytes[..bytes.len() - 2]).is_err());

        // A bad flag word is structural corruption.
        let mut bad_flag = bytes.clone();
        bad_flag[0] = 7;
        assert!(matches!(
            CompactDawg::read_from(bad_flag.as_slice()),
            Err(DawgError::Corrupt(_))
        ));

        // An unsorted alphabet table is rejected.
        let mut bad_alphabet = bytes.clone();
        bad_alphabet[8..12].copy_from_slice(&u32::from(u16::MAX).to_le_bytes());
        assert!(CompactDawg::read_from(bad_alphabet.as_slice()).is_err());
    }

    #[test]
    fn empty_and_blank_graphs() {
        let empty = MutableDawg::new().compress();
        assert_eq!(empty.len(), 0);
        assert_eq!(empty.transition_count(), 0);
        assert_eq!(empty.node_count(), 1);
        assert!(!empty.contains(""));
        assert_eq!(empty.iter().count(), 0);

        let mut blank = MutableDawg::new();
        blank.add("");
        let blank = blank.compress();
        assert_eq!(blank.len(), 1);
        assert_eq!(blank.transition_count(), 0);
        assert!(blank.contains(""));
        let words: Vec<String> = blank.iter().collect();
        assert_eq!(words, [""]);

        assert_ne!(empty, blank);

        let mut bytes = Vec::new();
        blank.write_to(&mut bytes).unwrap();
        let loaded = CompactDawg::read_from(bytes.as_slice()).unwrap();
        assert_eq!(loaded, blank);
        assert!(loaded.contains(""));
    }

    #[test]
    fn child_lookup_uses_the_block_binary_search() {
        let mut dawg = MutableDawg::new();
        dawg.add_all(["ba", "bc", "be", "bg", "bi", "bk"]);
        let compact = dawg.compress();
        let source = compact.source();
        let b = compact.child(source, 'b' as Letter).unwrap();
        for present in ['a', 'c', 'e', 'g', 'i', 'k'] {
            assert!(compact.child(b, present as Letter).is_some(), "{present}");
        }
        for absent in ['b', 'd', 'f', 'h', 'j', 'l', '`'] {
            assert!(compact.child(b, absent as Letter).is_none(), "{absent}");
        }
    }

    #[test]
    fn size_is_recomputed_after_deserialization() {
        let mut dawg = MutableDawg::new();
        dawg.add_all(["one", "two", "three"]);
        let mut bytes = Vec::new();
        dawg.compress().write_to(&mut bytes).unwrap();
        let loaded = CompactDawg::read_from(bytes.as_slice()).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.max_word_length(), 5);
        assert_eq!(loaded.node_count(), dawg.node_count());
    }
}
