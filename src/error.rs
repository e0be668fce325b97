//! Error types for the dawgset library.

use thiserror::Error;

/// Errors produced by the map facades, sub-views and file ingest.
///
/// The automaton itself never fails: `add`, `remove` and `contains`
/// report their outcome through their boolean results.
#[derive(Error, Debug)]
pub enum DawgError {
    /// A map key or value contains the reserved key/value separator
    /// (code unit `0x0000`).
    #[error("string contains the reserved separator character")]
    InvalidInput,

    /// An element passed to a sub-view operation lies outside the
    /// sub-view's range.
    #[error("element lies out of the sub-view range")]
    OutOfRange,

    /// The underlying byte source failed during file ingest.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A serialized compact automaton is truncated or malformed.
    #[error("malformed compact automaton data: {0}")]
    Corrupt(&'static str),
}

/// Result type alias for dawgset operations.
pub type Result<T> = std::result::Result<T, DawgError>;
