use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use kavosh_core::persist::{load_all, IndexPaths, LoadedIndex};
use kavosh_core::{IndexSource, Lemmatizer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    /// Score against the champion list instead of the full index.
    #[serde(default)]
    pub champion: bool,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub source: IndexSource,
    pub took_s: f64,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f64,
    pub title: String,
    pub url: Option<String>,
}

pub struct SearchState {
    pub index: LoadedIndex,
    /// Rebuilt from the index metadata so queries are analyzed like documents.
    pub lemmatizer: Box<dyn Lemmatizer>,
}

pub type AppState = Arc<SearchState>;

pub fn build_app(index_dir: String) -> Result<Router> {
    // Load the full index and champion list at startup
    let index = load_all(&IndexPaths::new(&index_dir))?;
    let lemmatizer = index.meta.lemmatizer.build()?;
    tracing::info!(lemmatizer = %index.meta.lemmatizer, num_docs = index.meta.num_docs, "index ready");
    let app_state: AppState = Arc::new(SearchState { index, lemmatizer });

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let source = IndexSource::from_champion_flag(params.champion);
    let k = params.k.max(1).min(100);
    let ranked = state.index.indexes.search(&params.q, state.lemmatizer.as_ref(), k, source);

    let results = ranked
        .into_iter()
        .map(|hit| {
            let meta = state.index.docs.get(&hit.doc_id);
            SearchHit {
                title: meta.map(|m| m.title.clone()).unwrap_or_default(),
                url: meta.and_then(|m| m.url.clone()),
                doc_id: hit.doc_id,
                score: hit.score,
            }
        })
        .collect();

    let elapsed = start.elapsed();
    Json(SearchResponse { query: params.q, source, took_s: elapsed.as_secs_f64(), results })
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<String>) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    match state.index.docs.get(&doc_id) {
        Some(meta) => Ok(Json(serde_json::json!({
            "doc_id": doc_id,
            "title": meta.title,
            "url": meta.url,
        }))),
        None => Err((StatusCode::NOT_FOUND, format!("document {doc_id} not found"))),
    }
}
