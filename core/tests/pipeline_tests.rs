use kavosh_core::tokenizer::analyze;
use kavosh_core::{build, champion_list, weight, Identity, IndexConfig, IndexSource, SearchIndexes};
use proptest::prelude::*;
use std::collections::HashMap;

fn search_indexes(docs: &[(&str, &str)], cfg: &IndexConfig) -> SearchIndexes {
    let index = build(docs.iter().copied(), &Identity);
    let weighted = weight(index, docs.len(), cfg).unwrap();
    SearchIndexes::from_weighted(weighted, cfg.champion_size)
}

const CAT_AND_DOG: [(&str, &str); 2] = [("1", "گربه روی میز است"), ("2", "سگ زیر میز است")];

#[test]
fn shared_term_matches_both_documents() {
    // With two documents a term in both has plain idf log10(1) = 0, so score it with smoothed idf.
    let cfg = IndexConfig { stop_list_size: 0, smoothed_idf: true, ..IndexConfig::default() };
    let idx = search_indexes(&CAT_AND_DOG, &cfg);
    let results = idx.search("میز", &Identity, 10, IndexSource::Full);
    let mut ids: Vec<&str> = results.iter().map(|r| r.doc_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(results.iter().all(|r| r.score > 0.0));
}

#[test]
fn stop_list_tie_removes_the_earlier_shared_term() {
    // "میز" and "است" both occur twice; "میز" is seen first.
    let cfg = IndexConfig { stop_list_size: 1, smoothed_idf: true, ..IndexConfig::default() };
    let idx = search_indexes(&CAT_AND_DOG, &cfg);
    assert!(idx.full.get("میز").is_none());
    assert!(idx.full.get("است").is_some());

    let results = idx.search("است", &Identity, 10, IndexSource::Full);
    assert_eq!(results.len(), 2);
    // The stop-listed term adds nothing.
    assert_eq!(idx.search("میز است", &Identity, 10, IndexSource::Full), results);
}

#[test]
fn shared_term_scores_with_plain_idf_in_larger_collection() {
    let docs = [CAT_AND_DOG[0], CAT_AND_DOG[1], ("3", "ماه در آسمان")];
    let cfg = IndexConfig { stop_list_size: 0, ..IndexConfig::default() };
    let idx = search_indexes(&docs, &cfg);
    let results = idx.search("میز", &Identity, 10, IndexSource::Champion);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.score > 0.0));
    assert!(idx.search("آسمان", &Identity, 10, IndexSource::Full)[0].doc_id == "3");
}

#[test]
fn default_stop_list_swallows_a_tiny_vocabulary() {
    let idx = search_indexes(&CAT_AND_DOG, &IndexConfig::default());
    assert!(idx.full.is_empty());
    assert!(idx.search("میز", &Identity, 10, IndexSource::Full).is_empty());
}

#[test]
fn unknown_tokens_return_empty_results() {
    let cfg = IndexConfig { stop_list_size: 0, ..IndexConfig::default() };
    let idx = search_indexes(&CAT_AND_DOG, &cfg);
    assert!(idx.search("هواپیما قطار", &Identity, 10, IndexSource::Full).is_empty());
    assert!(idx.search("", &Identity, 10, IndexSource::Champion).is_empty());
}

const VOCAB: &[&str] = &[
    "سیب", "انار", "موز", "گیلاس", "هلو", "خانه", "کتاب", "ها", "می", "رفت", "خواهم", "12", "،", "امروز",
];

fn collection() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::collection::vec(prop::sample::select(VOCAB), 0..15).prop_map(|words| words.join(" ")),
        1..8,
    )
}

fn with_ids(texts: &[String]) -> Vec<(String, String)> {
    texts.iter().enumerate().map(|(i, t)| (format!("doc{i}"), t.clone())).collect()
}

proptest! {
    #[test]
    fn positions_are_conserved_per_document(texts in collection()) {
        let docs = with_ids(&texts);
        let index = build(docs.clone(), &Identity);
        let mut per_doc: HashMap<&str, u64> = HashMap::new();
        for entry in index.terms.values() {
            for p in &entry.postings {
                *per_doc.entry(p.doc_id.as_str()).or_default() += p.term_frequency as u64;
            }
        }
        for (id, text) in &docs {
            let expected = analyze(text, &Identity).len() as u64;
            prop_assert_eq!(per_doc.get(id.as_str()).copied().unwrap_or(0), expected);
        }
        prop_assert!(index.check_invariants(docs.len()).is_ok());
    }

    #[test]
    fn weighting_normalizes_and_champions_are_consistent(texts in collection()) {
        let docs = with_ids(&texts);
        let cfg = IndexConfig { stop_list_size: 2, champion_size: 3, smoothed_idf: false };
        let weighted = weight(build(docs.clone(), &Identity), docs.len(), &cfg).unwrap();
        let full = &weighted.index;

        let mut squares: HashMap<&str, f64> = HashMap::new();
        for entry in full.terms.values() {
            let total: u64 = entry.postings.iter().map(|p| p.term_frequency as u64).sum();
            prop_assert_eq!(entry.collection_frequency, total);
            for p in &entry.postings {
                *squares.entry(p.doc_id.as_str()).or_default() += p.weight * p.weight;
            }
        }
        for sum in squares.values() {
            prop_assert!(*sum == 0.0 || (sum - 1.0).abs() < 1e-9, "sum of squares {}", sum);
        }

        let champions = champion_list(full, cfg.champion_size);
        prop_assert_eq!(champions.len(), full.len());
        for (term, kept) in &champions.terms {
            let entry = &full.terms[term];
            prop_assert_eq!(kept.collection_frequency, entry.collection_frequency);
            prop_assert!(kept.postings.len() <= cfg.champion_size);
            prop_assert!(kept.postings.windows(2).all(|w| w[0].weight >= w[1].weight));
            for p in &kept.postings {
                prop_assert_eq!(entry.posting(&p.doc_id), Some(p));
            }
        }
    }

    #[test]
    fn building_is_deterministic(texts in collection()) {
        let docs = with_ids(&texts);
        let cfg = IndexConfig { stop_list_size: 1, champion_size: 2, smoothed_idf: false };
        let first = SearchIndexes::from_weighted(weight(build(docs.clone(), &Identity), docs.len(), &cfg).unwrap(), 2);
        let second = SearchIndexes::from_weighted(weight(build(docs.clone(), &Identity), docs.len(), &cfg).unwrap(), 2);
        prop_assert_eq!(first, second);
    }
}
