use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kavosh_core::persist::{
    load_all, save_docs, save_meta, save_search_indexes, IndexPaths, MetaFile, FORMAT_VERSION,
};
use kavosh_core::{weight, DocMeta, DocumentId, IndexBuilder, IndexConfig, IndexSource, Lemmatizer, LemmatizerKind, SearchIndexes};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// A document as it appears in a JSON array or JSONL line.
#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    #[serde(flatten)]
    record: InputRecord,
}

/// The per-document record; keyed by id in collection-object files.
#[derive(Debug, Deserialize)]
struct InputRecord {
    #[serde(alias = "body")]
    content: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a positional TF-IDF index with champion lists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Number of most frequent terms dropped before weighting
        #[arg(long, default_value_t = kavosh_core::config::DEFAULT_STOP_LIST_SIZE)]
        stop_list_size: usize,
        /// Postings kept per term in the champion list
        #[arg(long, default_value_t = kavosh_core::config::DEFAULT_CHAMPION_SIZE)]
        champion_size: usize,
        /// Use smoothed IDF = log10(1 + N/df) instead of log10(N/df)
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
        /// Token lemmatizer: "identity" or "snowball:<language>"
        #[arg(long, default_value = "identity")]
        lemmatizer: LemmatizerKind,
    },
    /// Run one query against a built index
    Search {
        /// Index directory
        #[arg(long, default_value = "./index")]
        index: String,
        /// Free-text query
        #[arg(long)]
        query: String,
        /// Number of results
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Score against the champion list instead of the full index
        #[arg(long, default_value_t = false)]
        champion: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, stop_list_size, champion_size, smoothed_idf, lemmatizer } => {
            let config = IndexConfig { stop_list_size, champion_size, smoothed_idf };
            build_index(Path::new(&input), Path::new(&output), &config, &lemmatizer)
        }
        Commands::Search { index, query, k, champion } => search(Path::new(&index), &query, k, champion),
    }
}

/// Accumulates documents from any number of input files.
struct Ingest {
    builder: IndexBuilder,
    docs: BTreeMap<DocumentId, DocMeta>,
    lemmatizer: Box<dyn Lemmatizer>,
}

impl Ingest {
    fn new(lemmatizer: &LemmatizerKind) -> Result<Self> {
        let lemmatizer = lemmatizer.build()?;
        Ok(Self { builder: IndexBuilder::new(), docs: BTreeMap::new(), lemmatizer })
    }

    fn add(&mut self, id: String, record: InputRecord) {
        self.builder.add_document(&id, &record.content, self.lemmatizer.as_ref());
        self.docs.entry(id).or_insert(DocMeta { title: record.title, url: record.url });
    }
}

fn input_files(input: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input path {} does not exist", input.display());
    }
    Ok(files)
}

fn build_index(input: &Path, output: &Path, config: &IndexConfig, lemmatizer: &LemmatizerKind) -> Result<()> {
    let out_paths = IndexPaths::new(output);
    let mut ingest = Ingest::new(lemmatizer)?;

    for file in input_files(input)? {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            index_jsonl(&file, &mut ingest)?;
        } else {
            index_json(&file, &mut ingest)?;
        }
    }

    let num_docs = ingest.builder.doc_count();
    let full = ingest.builder.finish();
    let weighted = weight(full, num_docs, config).context("weighting index")?;
    let stop_words: Vec<String> = weighted.stop_list.iter().map(|(term, _)| term.clone()).collect();
    for (term, cf) in &weighted.stop_list {
        tracing::info!(term = term.as_str(), collection_frequency = cf, "stop word");
    }
    let indexes = SearchIndexes::from_weighted(weighted, config.champion_size);

    save_search_indexes(&out_paths, &indexes)?;
    save_docs(&out_paths, &ingest.docs)?;
    let meta = MetaFile {
        num_docs: num_docs as u64,
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        version: FORMAT_VERSION,
        config: config.clone(),
        lemmatizer: lemmatizer.clone(),
        stop_words,
    };
    save_meta(&out_paths, &meta)?;

    tracing::info!(output = %output.display(), num_docs, num_terms = indexes.full.len(), "index build complete");
    Ok(())
}

fn index_jsonl(file: &Path, ingest: &mut Ingest) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: malformed document", file.display(), n + 1))?;
        ingest.add(doc.id, doc.record);
    }
    Ok(())
}

fn index_json(file: &Path, ingest: &mut Ingest) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    let single = matches!(&json, serde_json::Value::Object(obj) if obj.contains_key("id"));
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: InputDoc = serde_json::from_value(v)?;
                ingest.add(doc.id, doc.record);
            }
        }
        // Either a single document or a collection keyed by document id.
        serde_json::Value::Object(_) if single => {
            let doc: InputDoc = serde_json::from_value(json)?;
            ingest.add(doc.id, doc.record);
        }
        serde_json::Value::Object(obj) => {
            for (id, v) in obj {
                let record: InputRecord = serde_json::from_value(v)
                    .with_context(|| format!("{}: malformed document {id}", file.display()))?;
                ingest.add(id, record);
            }
        }
        _ => tracing::warn!(file = %file.display(), "ignoring JSON that is neither an array nor an object"),
    }
    Ok(())
}

fn search(index_dir: &Path, query: &str, k: usize, champion: bool) -> Result<()> {
    let loaded = load_all(&IndexPaths::new(index_dir))?;
    let lemmatizer = loaded.meta.lemmatizer.build()?;
    let source = IndexSource::from_champion_flag(champion);

    let start = Instant::now();
    let results = loaded.indexes.search(query, lemmatizer.as_ref(), k.max(1), source);
    let elapsed = start.elapsed();

    if results.is_empty() {
        println!("no doc found.");
    }
    let empty = DocMeta { title: String::new(), url: None };
    for (rank, hit) in results.iter().enumerate() {
        let meta = loaded.docs.get(&hit.doc_id).unwrap_or(&empty);
        println!("{}- [{}] {:.4} {}", rank + 1, hit.doc_id, hit.score, meta.url.as_deref().unwrap_or("-"));
        println!("{}", meta.title);
        println!();
    }
    tracing::info!(?source, hits = results.len(), took_s = elapsed.as_secs_f64(), "search complete");
    Ok(())
}
