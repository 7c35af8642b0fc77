use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::IndexError;
use crate::lemmatizer::Lemmatizer;
use crate::tokenizer::analyze;

pub type DocumentId = String;
pub type Token = String;

/// Presentation fields carried next to the index; never used for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    pub title: String,
    pub url: Option<String>,
}

/// Occurrences of one term in one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocumentId,
    pub term_frequency: u32,
    /// Token offsets in first-seen order; `positions.len() == term_frequency`.
    pub positions: Vec<u32>,
    pub weight: f64, // cosine-normalized tf-idf, 0 until weighted
}

impl Posting {
    fn new(doc_id: &str) -> Self {
        Self { doc_id: doc_id.to_string(), term_frequency: 0, positions: Vec::new(), weight: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TermEntry {
    /// Sum of `term_frequency` over the full postings list.
    pub collection_frequency: u64,
    pub postings: Vec<Posting>, // one per document, in indexing order
    /// Ordinal of the term's first occurrence across the whole build.
    #[serde(default)]
    pub first_seen: u64,
}

impl TermEntry {
    pub fn document_frequency(&self) -> usize { self.postings.len() }

    pub fn posting(&self, doc_id: &str) -> Option<&Posting> {
        self.postings.iter().find(|p| p.doc_id == doc_id)
    }
}

/// Positional inverted index: term -> document -> positions.
///
/// Both the full index and the champion list use this shape. Terms are kept
/// ordered so iteration, serialization and tie-breaking are deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Index {
    pub terms: BTreeMap<Token, TermEntry>,
}

impl Index {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, term: &str) -> Option<&TermEntry> { self.terms.get(term) }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    /// Verify the bookkeeping of a full index built over `doc_count` documents.
    pub fn check_invariants(&self, doc_count: usize) -> Result<(), IndexError> {
        for (term, entry) in &self.terms {
            if entry.postings.is_empty() {
                return Err(IndexError::invariant(term, "document frequency is zero"));
            }
            if entry.document_frequency() > doc_count {
                return Err(IndexError::invariant(
                    term,
                    format!("document frequency {} exceeds {doc_count} documents", entry.document_frequency()),
                ));
            }
            let mut seen = HashSet::with_capacity(entry.postings.len());
            let mut total = 0u64;
            for posting in &entry.postings {
                if !seen.insert(posting.doc_id.as_str()) {
                    return Err(IndexError::invariant(term, format!("duplicate posting for {}", posting.doc_id)));
                }
                if posting.term_frequency == 0 || posting.positions.len() != posting.term_frequency as usize {
                    return Err(IndexError::invariant(
                        term,
                        format!(
                            "posting for {} has {} positions but term frequency {}",
                            posting.doc_id,
                            posting.positions.len(),
                            posting.term_frequency
                        ),
                    ));
                }
                total += posting.term_frequency as u64;
            }
            if total != entry.collection_frequency {
                return Err(IndexError::invariant(
                    term,
                    format!("collection frequency {} but postings sum to {total}", entry.collection_frequency),
                ));
            }
        }
        Ok(())
    }
}

/// Accumulates documents into a full positional index, one document at a time.
#[derive(Default)]
pub struct IndexBuilder {
    index: Index,
    doc_count: usize,
    seen: HashSet<DocumentId>,
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    /// Analyze and index one document. Returns the number of tokens indexed.
    /// A repeated id is skipped.
    pub fn add_document(&mut self, doc_id: &str, text: &str, lemmatizer: &dyn Lemmatizer) -> usize {
        if !self.seen.insert(doc_id.to_string()) {
            tracing::warn!(doc_id, "duplicate document id, skipping");
            return 0;
        }
        self.doc_count += 1;
        let tokens = analyze(text, lemmatizer);
        let count = tokens.len();
        for (pos, token) in tokens.into_iter().enumerate() {
            let ordinal = self.index.terms.len() as u64;
            let entry = self
                .index
                .terms
                .entry(token)
                .or_insert_with(|| TermEntry { first_seen: ordinal, ..TermEntry::default() });
            // Documents are indexed whole, so this document's posting is always the last one.
            if entry.postings.last().map_or(true, |p| p.doc_id != doc_id) {
                entry.postings.push(Posting::new(doc_id));
            }
            entry.collection_frequency += 1;
            if let Some(posting) = entry.postings.last_mut() {
                posting.term_frequency += 1;
                posting.positions.push(pos as u32);
            }
        }
        tracing::debug!(doc_id, tokens = count, "indexed document");
        count
    }

    /// Documents accepted so far, including empty ones.
    pub fn doc_count(&self) -> usize { self.doc_count }

    pub fn finish(self) -> Index {
        tracing::info!(num_docs = self.doc_count, num_terms = self.index.len(), "built positional index");
        self.index
    }
}

/// Build the full positional index over `documents`, in iteration order.
pub fn build<I, K, V>(documents: I, lemmatizer: &dyn Lemmatizer) -> Index
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut builder = IndexBuilder::new();
    for (doc_id, text) in documents {
        builder.add_document(doc_id.as_ref(), text.as_ref(), lemmatizer);
    }
    builder.finish()
}
