//! Positional TF-IDF search over Persian text.
//!
//! Documents flow through [`normalizer`] and [`tokenizer`], are indexed by
//! [`index`], weighted by [`weighting`] and queried through [`query`].

pub mod config;
pub mod error;
pub mod index;
pub mod lemmatizer;
pub mod normalizer;
pub mod persist;
pub mod query;
pub mod tokenizer;
pub mod weighting;

pub use config::IndexConfig;
pub use error::{IndexError, LemmatizerError, PersistError};
pub use index::{build, DocMeta, DocumentId, Index, IndexBuilder, Posting, TermEntry, Token};
pub use lemmatizer::{Identity, Lemmatizer, LemmatizerKind};
pub use query::{query, IndexSource, ScoredDocument, SearchIndexes};
pub use weighting::{champion_list, weight, Weighted};
