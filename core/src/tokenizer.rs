use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use crate::lemmatizer::Lemmatizer;
use crate::normalizer::normalize;

lazy_static! {
    static ref SEPARATED: Regex =
        Regex::new(r#"([؟!?]+|[\d.:]+|[:.،؛»\])}"«\[({/\\])"#).expect("valid regex");
    static ref FUTURE_AUXILIARIES: HashSet<&'static str> = {
        let words: &[&str] = &[
            "خواهم", "خواهی", "خواهد", "خواهیم", "خواهید", "خواهند",
            "نخواهم", "نخواهی", "نخواهد", "نخواهیم", "نخواهید", "نخواهند",
        ];
        words.iter().copied().collect()
    };
}

pub fn is_future_auxiliary(token: &str) -> bool { FUTURE_AUXILIARIES.contains(token) }

/// Split normalized text on whitespace; punctuation and number runs become tokens of their own.
pub fn tokenize(text: &str) -> Vec<String> {
    let flat = text.replace(['\n', '\t'], " ");
    SEPARATED
        .replace_all(&flat, " $1 ")
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fuse future-tense auxiliaries into the verb stem on their right, e.g.
/// `["خواهم", "رفت"]` becomes `["خواهم_رفت"]`.
///
/// An auxiliary with no token to its right is dropped. A single token is
/// returned as-is, even when it is an auxiliary.
pub fn process_verbs(tokens: Vec<String>) -> Vec<String> {
    if tokens.len() == 1 {
        return tokens;
    }
    // Slot 0 absorbs a trailing auxiliary and is discarded.
    let mut fused: Vec<String> = vec![String::new()];
    for token in tokens.into_iter().rev() {
        if is_future_auxiliary(&token) {
            if let Some(right) = fused.last_mut() {
                *right = format!("{token}_{right}");
            }
        } else {
            fused.push(token);
        }
    }
    fused.into_iter().skip(1).rev().collect()
}

/// Full document/query analysis: normalize, tokenize, fuse verbs, lemmatize.
/// Index positions are offsets into the returned sequence.
pub fn analyze(text: &str, lemmatizer: &dyn Lemmatizer) -> Vec<String> {
    let normalized = normalize(text);
    process_verbs(tokenize(&normalized))
        .into_iter()
        .map(|token| lemmatizer.lemmatize(&token))
        .collect()
}
