//! Error types for index weighting, persistence and lemmatizer configuration.
//!
//! Analysis and querying never fail; only the stages that consume a whole
//! index or touch storage have error variants.

use thiserror::Error;

/// Errors raised while validating or weighting a freshly built index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// IDF is undefined without documents.
    #[error("cannot weight an index built from zero documents")]
    EmptyCollection,

    /// The builder produced an index that breaks its own bookkeeping.
    #[error("index invariant violated for term {term:?}: {reason}")]
    Invariant { term: String, reason: String },
}

impl IndexError {
    pub(crate) fn invariant(term: &str, reason: impl Into<String>) -> Self {
        IndexError::Invariant { term: term.to_string(), reason: reason.into() }
    }
}

/// Errors raised while reading or writing persisted index artifacts.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blob bytes could not be encoded or decoded.
    #[error("malformed index artifact: {0}")]
    Decode(#[from] bincode::Error),

    #[error("malformed metadata: {0}")]
    Meta(#[from] serde_json::Error),

    /// The blob decoded but does not carry the expected top-level name.
    #[error("index artifact is missing key {expected:?} (found {found:?})")]
    MissingKey { expected: String, found: String },
}

/// Errors raised when parsing a lemmatizer specification.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LemmatizerError {
    #[error("unknown lemmatizer {0:?}, expected \"identity\" or \"snowball:<language>\"")]
    UnknownKind(String),

    #[error("unsupported snowball language {0:?}")]
    UnknownLanguage(String),
}
