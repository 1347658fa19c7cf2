use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tfidf_core::corpus::load_corpus;
use tfidf_core::tokenizer::clean_word;
use tfidf_core::{DocId, Document, KvStore, QueryEngine, QueryOutcome, SledStore};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const PAGE_SIZE: usize = 8;

pub struct ServerConfig {
    pub index: PathBuf,
    pub norms: PathBuf,
    pub corpus: PathBuf,
    /// Results retrieved per query, before pagination.
    pub k: usize,
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_page")]
    pub page: usize,
}
fn default_page() -> usize { 1 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub page: usize,
    pub has_next: bool,
    pub idf: Vec<TermIdf>,
    pub stopwords: Vec<String>,
    pub unknown: Vec<String>,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct TermIdf {
    pub term: String,
    pub idf: f64,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub rank: usize,
    pub doc_id: DocId,
    pub score: f64,
    pub title: String,
    pub author: String,
    pub published_date: String,
    /// Query words whose terms this document contains.
    pub terms: Vec<String>,
    pub snippet: Option<String>,
}

/// Read-only state shared by every request; nothing here changes after startup.
#[derive(Clone)]
pub struct AppState {
    pub postings: SledStore,
    pub norms: SledStore,
    pub docs: Arc<HashMap<DocId, Document>>,
    /// Terms in the postings store, counted once at startup.
    pub term_count: usize,
    pub k: usize,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, msg: impl ToString) -> ApiError {
    (status, Json(serde_json::json!({ "error": msg.to_string() })))
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    let postings = SledStore::open_for_read(&config.index)?;
    let norms = SledStore::open_for_read(&config.norms)?;
    let term_count = postings.len()?;
    let docs = load_corpus(&config.corpus)?;
    tracing::info!(index = %config.index.display(), terms = term_count, documents = docs.len(), k = config.k, "index opened");
    let app_state = AppState { postings, norms, docs: Arc::new(docs), term_count, k: config.k };

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

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let outcome = QueryEngine::with_term_count(&state.postings, &state.norms, state.term_count)
        .query(&params.q, state.k)
        .map_err(|e| {
            tracing::error!(error = %e, query = %params.q, "query failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        })?;

    let page = params.page.max(1);
    let offset = (page - 1).saturating_mul(PAGE_SIZE);
    let has_next = outcome.hits.len() > page.saturating_mul(PAGE_SIZE);
    let results = outcome
        .hits
        .iter()
        .enumerate()
        .skip(offset)
        .take(PAGE_SIZE)
        .filter_map(|(i, hit)| {
            let doc = state.docs.get(&hit.doc_id)?;
            Some(search_hit(i + 1, hit.doc_id, hit.score, doc, &outcome))
        })
        .collect();

    let idf = outcome.terms.iter().map(|t| TermIdf { term: t.surface.clone(), idf: round4(t.idf) }).collect();
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        took_s: elapsed.as_secs_f64(),
        total_hits: outcome.total_hits,
        page,
        has_next,
        idf,
        stopwords: outcome.stopwords,
        unknown: outcome.unknown,
        results,
    }))
}

fn search_hit(rank: usize, doc_id: DocId, score: f64, doc: &Document, outcome: &QueryOutcome) -> SearchHit {
    let terms: Vec<String> = outcome.matched_surfaces(doc_id).into_iter().map(str::to_string).collect();
    SearchHit {
        rank,
        doc_id,
        score: round4(score),
        title: doc.title.clone(),
        author: doc.author.clone(),
        published_date: doc.published_date.clone(),
        snippet: snippet(&doc.content, &terms),
        terms,
    }
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<serde_json::Value>, ApiError> {
    let doc = state.docs.get(&doc_id).ok_or_else(|| api_error(StatusCode::NOT_FOUND, "not found"))?;
    Ok(Json(serde_json::json!({
        "doc_id": doc_id,
        "title": doc.title,
        "author": doc.author,
        "published_date": doc.published_date,
        "text": doc.content,
    })))
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

fn snippet(text: &str, raw_terms: &[String]) -> Option<String> {
    if text.is_empty() { return None; }
    let pat = terms_pattern(raw_terms);
    let snippet = match pat.as_ref().and_then(|p| p.find(text)) {
        Some(m) => {
            let idx = m.start();
            let start = char_boundary(text, idx.saturating_sub(100));
            let end = char_boundary(text, (idx + 200).min(text.len()));
            text[start..end].to_string()
        }
        None => text.chars().take(200).collect(),
    };
    match pat {
        Some(p) => Some(p.replace_all(&snippet, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).into_owned()),
        None => Some(snippet),
    }
}

/// One case-insensitive alternation over the query words, stripped the way
/// the normalizer strips them. Longer words come first so they win over prefixes.
fn terms_pattern(raw_terms: &[String]) -> Option<regex::Regex> {
    let mut words: Vec<String> = raw_terms.iter().map(|t| clean_word(t)).filter(|w| !w.is_empty()).collect();
    if words.is_empty() { return None; }
    words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    words.dedup();
    let alternation = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
    regex::RegexBuilder::new(&alternation).case_insensitive(true).build().ok()
}

/// Largest char boundary at or before `idx`.
fn char_boundary(text: &str, mut idx: usize) -> usize {
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
