//! TF-IDF weighting, cosine normalization and champion-list derivation.

use std::collections::BTreeMap;

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::index::{DocumentId, Index, TermEntry, Token};

/// A weighted full index plus what the weighting pass learned about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Weighted {
    pub index: Index,
    /// Euclidean length of each document's raw tf-idf vector (1 for a zero vector).
    pub doc_norms: BTreeMap<DocumentId, f64>,
    /// Terms removed before weighting, with their collection frequency.
    pub stop_list: Vec<(Token, u64)>,
}

/// The `size` terms with the highest collection frequency. Ties go to the
/// term that occurred first in the collection.
pub fn stop_list(index: &Index, size: usize) -> Vec<(Token, u64)> {
    let mut ranked: Vec<(&Token, &TermEntry)> = index.terms.iter().collect();
    ranked.sort_by(|a, b| {
        b.1.collection_frequency
            .cmp(&a.1.collection_frequency)
            .then(a.1.first_seen.cmp(&b.1.first_seen))
    });
    ranked.into_iter().take(size).map(|(term, entry)| (term.clone(), entry.collection_frequency)).collect()
}

/// Remove the stop list, then assign every posting its cosine-normalized
/// tf-idf weight over a collection of `doc_count` documents.
pub fn weight(mut index: Index, doc_count: usize, config: &IndexConfig) -> Result<Weighted, IndexError> {
    if doc_count == 0 {
        return Err(IndexError::EmptyCollection);
    }
    index.check_invariants(doc_count)?;

    let stop_list = stop_list(&index, config.stop_list_size);
    for (term, _) in &stop_list {
        index.terms.remove(term);
    }
    tracing::info!(
        removed = stop_list.len(),
        remaining = index.len(),
        stop_words = ?stop_list.iter().map(|(t, _)| t.as_str()).collect::<Vec<_>>(),
        "applied stop list"
    );

    // First pass: raw tf-idf and per-document sums of squares
    let mut sums: BTreeMap<DocumentId, f64> = BTreeMap::new();
    for entry in index.terms.values_mut() {
        let idf = config.idf(doc_count, entry.document_frequency());
        for posting in entry.postings.iter_mut() {
            let tf = 1.0 + (posting.term_frequency as f64).log10();
            posting.weight = tf * idf;
            *sums.entry(posting.doc_id.clone()).or_insert(0.0) += posting.weight * posting.weight;
        }
    }
    let doc_norms: BTreeMap<DocumentId, f64> = sums
        .into_iter()
        .map(|(doc_id, sum)| (doc_id, if sum > 0.0 { sum.sqrt() } else { 1.0 }))
        .collect();

    // Second pass: unit-length document vectors
    for entry in index.terms.values_mut() {
        for posting in entry.postings.iter_mut() {
            if let Some(norm) = doc_norms.get(&posting.doc_id) {
                posting.weight /= norm;
            }
        }
    }

    tracing::info!(num_docs = doc_count, weighted_docs = doc_norms.len(), "weighted index");
    Ok(Weighted { index, doc_norms, stop_list })
}

/// Keep at most `size` postings per term, highest weight first. Equal weights
/// keep indexing order. Collection frequencies are copied from the full index.
pub fn champion_list(index: &Index, size: usize) -> Index {
    let terms = index
        .terms
        .iter()
        .map(|(term, entry)| {
            let mut postings = entry.postings.clone();
            postings.sort_by(|a, b| b.weight.total_cmp(&a.weight));
            postings.truncate(size);
            let kept = TermEntry { collection_frequency: entry.collection_frequency, postings, first_seen: entry.first_seen };
            (term.clone(), kept)
        })
        .collect();
    Index { terms }
}
