//! Token canonicalization seam.
//!
//! Index construction and query analysis must share one [`Lemmatizer`]; the
//! persisted index records which [`LemmatizerKind`] built it.

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LemmatizerError;

/// Maps a token to its canonical form.
pub trait Lemmatizer: Send + Sync {
    fn lemmatize(&self, token: &str) -> String;
}

impl<F> Lemmatizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn lemmatize(&self, token: &str) -> String {
        self(token)
    }
}

/// Leaves tokens untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Lemmatizer for Identity {
    fn lemmatize(&self, token: &str) -> String {
        token.to_string()
    }
}

/// Snowball stemmer for one language.
pub struct SnowballLemmatizer {
    stemmer: Stemmer,
}

impl SnowballLemmatizer {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { stemmer: Stemmer::create(algorithm) }
    }
}

impl Lemmatizer for SnowballLemmatizer {
    fn lemmatize(&self, token: &str) -> String {
        self.stemmer.stem(token).into_owned()
    }
}

fn snowball_algorithm(language: &str) -> Option<Algorithm> {
    let algorithm = match language {
        "arabic" => Algorithm::Arabic,
        "danish" => Algorithm::Danish,
        "dutch" => Algorithm::Dutch,
        "english" => Algorithm::English,
        "finnish" => Algorithm::Finnish,
        "french" => Algorithm::French,
        "german" => Algorithm::German,
        "greek" => Algorithm::Greek,
        "hungarian" => Algorithm::Hungarian,
        "italian" => Algorithm::Italian,
        "norwegian" => Algorithm::Norwegian,
        "portuguese" => Algorithm::Portuguese,
        "romanian" => Algorithm::Romanian,
        "russian" => Algorithm::Russian,
        "spanish" => Algorithm::Spanish,
        "swedish" => Algorithm::Swedish,
        "tamil" => Algorithm::Tamil,
        "turkish" => Algorithm::Turkish,
        _ => return None,
    };
    Some(algorithm)
}

/// Serializable description of a lemmatizer, written as `identity` or
/// `snowball:<language>`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LemmatizerKind {
    #[default]
    Identity,
    Snowball(String),
}

impl LemmatizerKind {
    /// Instantiate the lemmatizer. A `Snowball` kind built without parsing may
    /// still name an unsupported language.
    pub fn build(&self) -> Result<Box<dyn Lemmatizer>, LemmatizerError> {
        match self {
            LemmatizerKind::Identity => Ok(Box::new(Identity)),
            LemmatizerKind::Snowball(language) => match snowball_algorithm(language) {
                Some(algorithm) => Ok(Box::new(SnowballLemmatizer::new(algorithm))),
                None => Err(LemmatizerError::UnknownLanguage(language.clone())),
            },
        }
    }
}

impl FromStr for LemmatizerKind {
    type Err = LemmatizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "identity" {
            return Ok(LemmatizerKind::Identity);
        }
        match s.strip_prefix("snowball:") {
            Some(language) if snowball_algorithm(language).is_some() => {
                Ok(LemmatizerKind::Snowball(language.to_string()))
            }
            Some(language) => Err(LemmatizerError::UnknownLanguage(language.to_string())),
            None => Err(LemmatizerError::UnknownKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for LemmatizerKind {
    type Error = LemmatizerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LemmatizerKind> for String {
    fn from(kind: LemmatizerKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for LemmatizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LemmatizerKind::Identity => write!(f, "identity"),
            LemmatizerKind::Snowball(language) => write!(f, "snowball:{language}"),
        }
    }
}
