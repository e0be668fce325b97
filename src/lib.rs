//! # dawgset
//!
//! Minimal acyclic word graphs
//! ([DAWG](https://en.wikipedia.org/wiki/Deterministic_acyclic_finite_state_automaton))
//! for storing large string sets with ordered, filtered enumeration.
//!
//! Two interoperable forms are provided. [`MutableDawg`] accepts and
//! removes words online while staying minimal after every operation:
//! shared stretches of the graph are copy-on-write cloned before
//! mutation, and an equivalence registry re-merges the changed path.
//! [`CompactDawg`] is the frozen projection of a builder into one flat
//! integer array: immutable, cheap to share between threads, and
//! serializable.
//!
//! Both answer the same [`DawgSet`] interface: membership, ascending
//! and descending iteration, prefix/substring/suffix filters, range
//! slices, and live navigable sub-views. Map and multi-map facades over
//! the set live in [`map`].
//!
//! ## Quick start
//!
//! ```
//! use dawgset::{DawgSet, MutableDawg, Query};
//!
//! let mut dawg = MutableDawg::new();
//! dawg.add_all(["bake", "baked", "bakes", "cake", "cakes"]);
//! assert!(dawg.contains("cake"));
//!
//! let bakes: Vec<String> = dawg.strings_starting_with("bake").collect();
//! assert_eq!(bakes, ["bake", "baked", "bakes"]);
//!
//! let plurals: Vec<String> = dawg
//!     .search(Query::new().ending_with("s").descending(true))
//!     .collect();
//! assert_eq!(plurals, ["cakes", "bakes"]);
//! ```
//!
//! ## Freezing and thawing
//!
//! ```
//! use dawgset::{CompactDawg, DawgSet, MutableDawg};
//!
//! let mut dawg = MutableDawg::new();
//! dawg.add_all(["left", "lend", "lent"]);
//!
//! let compact = dawg.compress();
//! let mut bytes = Vec::new();
//! compact.write_to(&mut bytes).unwrap();
//!
//! let loaded = CompactDawg::read_from(bytes.as_slice()).unwrap();
//! assert_eq!(loaded, compact);
//! assert!(loaded.contains("lent"));
//!
//! let mut thawed = loaded.uncompress();
//! thawed.remove("lend");
//! assert_eq!(thawed.len(), 2);
//! ```

#![warn(missing_docs)]

pub mod dawg;
pub mod error;
pub mod map;

pub use dawg::{
    Automaton, CompactDawg, CompactNodeId, DawgSet, Letter, MutableDawg, NodeId, Query, Strings,
    SubSet,
};
pub use error::DawgError;
