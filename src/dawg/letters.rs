use smallvec::SmallVec;

/// A transition label: one UTF-16 code unit.
///
/// The automaton's alphabet is the full 16-bit range. Code unit 0 is a
/// valid letter here; only the map facades reserve it as their key/value
/// separator.
pub type Letter = u16;

/// The key/value separator used by the map facades.
pub const SEPARATOR: Letter = 0;

/// A word collected into its code-unit buffer.
///
/// Words rarely exceed 32 units, so the common case stays on the stack.
pub type Word = SmallVec<[Letter; 32]>;

/// Encodes a string into its UTF-16 code units.
pub fn encode(s: &str) -> Word {
    s.encode_utf16().collect()
}

/// Compares two strings by their UTF-16 code units, the order the
/// automaton stores and enumerates words in. Differs from `str`'s own
/// byte-wise order only for supplementary-plane characters.
pub(crate) fn cmp(a: &str, b: &str) -> std::cmp::Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Decodes stored code units back into a `String`.
///
/// Only whole stored words are ever decoded, and every stored word was
/// encoded from a valid `&str`, so the lossy fallback never fires in
/// practice.
pub fn decode(units: &[Letter]) -> String {
    String::from_utf16_lossy(units)
}
