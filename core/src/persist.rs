use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::config::IndexConfig;
use crate::error::PersistError;
use crate::lemmatizer::LemmatizerKind;
use crate::query::SearchIndexes;
use crate::{DocMeta, DocumentId, Index};

pub const FULL_INDEX: &str = "full_index";
pub const CHAMPION_LIST: &str = "champion_list";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u64,
    pub created_at: String,
    pub version: u32,
    pub config: IndexConfig,
    /// Must be rebuilt identically on the query side.
    pub lemmatizer: LemmatizerKind,
    #[serde(default)]
    pub stop_words: Vec<String>,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn blob(&self, name: &str) -> PathBuf { self.root.join(format!("{name}.bin")) }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

#[derive(Serialize)]
struct NamedBlobRef<'a> {
    name: &'a str,
    index: &'a Index,
}

#[derive(Deserialize)]
struct NamedBlob {
    name: String,
    index: Index,
}

pub fn serialize(index: &Index) -> Result<Vec<u8>, PersistError> {
    Ok(bincode::serialize(index)?)
}

pub fn deserialize(bytes: &[u8]) -> Result<Index, PersistError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Encode `index` as a blob tagged with `name`.
pub fn encode_named(name: &str, index: &Index) -> Result<Vec<u8>, PersistError> {
    Ok(bincode::serialize(&NamedBlobRef { name, index })?)
}

/// Decode a blob, rejecting one tagged with any name other than `expected`.
pub fn decode_named(expected: &str, bytes: &[u8]) -> Result<Index, PersistError> {
    let blob: NamedBlob = bincode::deserialize(bytes)?;
    if blob.name != expected {
        return Err(PersistError::MissingKey { expected: expected.to_string(), found: blob.name });
    }
    Ok(blob.index)
}

pub fn save_index(paths: &IndexPaths, name: &str, index: &Index) -> Result<(), PersistError> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.blob(name))?;
    f.write_all(&encode_named(name, index)?)?;
    Ok(())
}

pub fn load_index(paths: &IndexPaths, name: &str) -> Result<Index, PersistError> {
    let mut f = File::open(paths.blob(name))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    decode_named(name, &buf)
}

pub fn save_docs(paths: &IndexPaths, docs: &BTreeMap<DocumentId, DocMeta>) -> Result<(), PersistError> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.docs())?;
    let bytes = bincode::serialize(docs)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_docs(paths: &IndexPaths) -> Result<BTreeMap<DocumentId, DocMeta>, PersistError> {
    let mut f = File::open(paths.docs())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<(), PersistError> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile, PersistError> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

/// Everything a searcher loads at startup.
pub struct LoadedIndex {
    pub indexes: SearchIndexes,
    pub docs: BTreeMap<DocumentId, DocMeta>,
    pub meta: MetaFile,
}

pub fn save_search_indexes(paths: &IndexPaths, indexes: &SearchIndexes) -> Result<(), PersistError> {
    save_index(paths, FULL_INDEX, &indexes.full)?;
    save_index(paths, CHAMPION_LIST, &indexes.champion)
}

pub fn load_all(paths: &IndexPaths) -> Result<LoadedIndex, PersistError> {
    let meta = load_meta(paths)?;
    let full = load_index(paths, FULL_INDEX)?;
    let champion = load_index(paths, CHAMPION_LIST)?;
    let docs = load_docs(paths)?;
    tracing::info!(num_docs = meta.num_docs, num_terms = full.len(), root = %paths.root.display(), "loaded index");
    Ok(LoadedIndex { indexes: SearchIndexes::new(full, champion), docs, meta })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build;
    use crate::lemmatizer::Identity;
    use tempfile::tempdir;

    fn sample() -> Index {
        build([("1", "گربه روی میز"), ("2", "سگ زیر میز")], &Identity)
    }

    #[test]
    fn blob_round_trip() {
        let index = sample();
        assert_eq!(deserialize(&serialize(&index).unwrap()).unwrap(), index);
    }

    #[test]
    fn wrong_blob_name_is_missing_key() {
        let bytes = encode_named(CHAMPION_LIST, &sample()).unwrap();
        let err = decode_named(FULL_INDEX, &bytes).unwrap_err();
        assert!(matches!(err, PersistError::MissingKey { ref found, .. } if found == CHAMPION_LIST));
    }

    #[test]
    fn truncated_blob_is_decode_error() {
        let bytes = encode_named(FULL_INDEX, &sample()).unwrap();
        let err = decode_named(FULL_INDEX, &bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, PersistError::Decode(_)));
    }

    #[test]
    fn saves_and_loads_directory() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let indexes = SearchIndexes::new(sample(), Index::new());
        save_search_indexes(&paths, &indexes).unwrap();
        let mut docs = BTreeMap::new();
        docs.insert("1".to_string(), DocMeta { title: "گربه".into(), url: None });
        save_docs(&paths, &docs).unwrap();
        let meta = MetaFile {
            num_docs: 2,
            created_at: "2024-01-01T00:00:00Z".into(),
            version: FORMAT_VERSION,
            config: IndexConfig::default(),
            lemmatizer: LemmatizerKind::Identity,
            stop_words: vec![],
        };
        save_meta(&paths, &meta).unwrap();

        let loaded = load_all(&paths).unwrap();
        assert_eq!(loaded.indexes, indexes);
        assert_eq!(loaded.docs, docs);
        assert_eq!(loaded.meta, meta);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("nope"));
        assert!(matches!(load_all(&paths), Err(PersistError::Io(_))));
    }
}
