use serde::{Deserialize, Serialize};

pub const DEFAULT_STOP_LIST_SIZE: usize = 50;
pub const DEFAULT_CHAMPION_SIZE: usize = 20;

/// Tunables for the weighting stage. Recorded alongside persisted indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of highest collection-frequency terms dropped before weighting.
    pub stop_list_size: usize,
    /// Postings kept per term in the champion list.
    pub champion_size: usize,
    /// Use idf = log10(1 + N/df) instead of log10(N/df).
    pub smoothed_idf: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            stop_list_size: DEFAULT_STOP_LIST_SIZE,
            champion_size: DEFAULT_CHAMPION_SIZE,
            smoothed_idf: false,
        }
    }
}

impl IndexConfig {
    pub fn idf(&self, doc_count: usize, document_frequency: usize) -> f64 {
        let ratio = doc_count as f64 / document_frequency as f64;
        if self.smoothed_idf { (1.0 + ratio).log10() } else { ratio.log10() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: IndexConfig = serde_json::from_str(r#"{"champion_size": 5}"#).unwrap();
        assert_eq!(cfg.champion_size, 5);
        assert_eq!(cfg.stop_list_size, DEFAULT_STOP_LIST_SIZE);
        assert!(!cfg.smoothed_idf);
    }

    #[test]
    fn idf_of_ubiquitous_term() {
        let plain = IndexConfig::default();
        assert_eq!(plain.idf(4, 4), 0.0);
        assert!((plain.idf(100, 1) - 2.0).abs() < 1e-12);
        let smoothed = IndexConfig { smoothed_idf: true, ..IndexConfig::default() };
        assert!((smoothed.idf(4, 4) - 2f64.log10()).abs() < 1e-12);
    }
}
