use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::index::{DocumentId, Index};
use crate::lemmatizer::Lemmatizer;
use crate::tokenizer::analyze;
use crate::weighting::{champion_list, Weighted};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub doc_id: DocumentId,
    pub score: f64,
}

/// Which postings a query is scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexSource {
    /// Every posting; exact scores.
    #[default]
    Full,
    /// Top postings per term only; faster, may miss documents.
    Champion,
}

impl IndexSource {
    pub fn from_champion_flag(use_champion_list: bool) -> Self {
        if use_champion_list { IndexSource::Champion } else { IndexSource::Full }
    }
}

/// Rank documents for `text` against `index`, best first, at most `k`.
///
/// The query goes through the same analysis as indexed documents. Tokens
/// missing from the index add nothing; a query with no known tokens yields
/// an empty ranking.
pub fn query(text: &str, lemmatizer: &dyn Lemmatizer, index: &Index, k: usize) -> Vec<ScoredDocument> {
    let tokens = analyze(text, lemmatizer);
    score_tokens(&tokens, index, k)
}

/// Sum posting weights per document over already-analyzed query tokens.
pub fn score_tokens(tokens: &[String], index: &Index, k: usize) -> Vec<ScoredDocument> {
    let mut scores: HashMap<&str, f64> = HashMap::new();
    for token in tokens {
        let Some(entry) = index.get(token) else { continue };
        for posting in &entry.postings {
            *scores.entry(posting.doc_id.as_str()).or_insert(0.0) += posting.weight;
        }
    }
    let mut ranked: Vec<ScoredDocument> = scores
        .into_iter()
        .map(|(doc_id, score)| ScoredDocument { doc_id: doc_id.to_string(), score })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id)));
    ranked.truncate(k);
    ranked
}

/// The two immutable lookup structures a searcher needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchIndexes {
    pub full: Index,
    pub champion: Index,
}

impl SearchIndexes {
    pub fn new(full: Index, champion: Index) -> Self { Self { full, champion } }

    /// Derive the champion list from a weighted full index.
    pub fn from_weighted(weighted: Weighted, champion_size: usize) -> Self {
        let champion = champion_list(&weighted.index, champion_size);
        Self { full: weighted.index, champion }
    }

    pub fn source(&self, source: IndexSource) -> &Index {
        match source {
            IndexSource::Full => &self.full,
            IndexSource::Champion => &self.champion,
        }
    }

    pub fn search(&self, text: &str, lemmatizer: &dyn Lemmatizer, k: usize, source: IndexSource) -> Vec<ScoredDocument> {
        let results = query(text, lemmatizer, self.source(source), k);
        tracing::debug!(query = text, ?source, hits = results.len(), "scored query");
        results
    }
}
