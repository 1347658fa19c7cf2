use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

pub type DocId = u32;

/// A corpus record. Only `title` and `content` are indexed; the rest is for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub author: String,
    /// Pre-formatted display string, e.g. `2017/3/15`.
    pub published_date: String,
    pub content: String,
}

impl Document {
    pub fn from_fields(id: DocId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self { id, title: title.into(), content: content.into(), ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f64, // log tf
}

/// A ranked hit. Orders by score, then lower doc id ranks higher, so `max` is the best hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredDoc {
    pub score: f64,
    pub doc_id: DocId,
}

impl Eq for ScoredDoc {}

impl Ord for ScoredDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.doc_id.cmp(&self.doc_id))
    }
}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A distinct known query term with the weights used to score it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryTerm {
    /// First query word that normalized to `term`.
    pub surface: String,
    pub term: String,
    pub query_count: u32,
    pub df: usize,
    pub idf: f64,
    /// tf(query_count) * idf
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryOutcome {
    /// At most k hits, best first.
    pub hits: Vec<ScoredDoc>,
    pub stopwords: Vec<String>,
    pub unknown: Vec<String>,
    pub terms: Vec<QueryTerm>,
    /// Normalized terms contained by each returned document, in query order.
    pub matches: HashMap<DocId, Vec<String>>,
    /// Number of documents scored before top-k truncation.
    pub total_hits: usize,
}

impl QueryOutcome {
    pub fn idf_of(&self, term: &str) -> Option<f64> {
        self.terms.iter().find(|t| t.term == term).map(|t| t.idf)
    }

    /// Surface words of the query terms a document matched.
    pub fn matched_surfaces(&self, doc_id: DocId) -> Vec<&str> {
        let Some(terms) = self.matches.get(&doc_id) else { return Vec::new() };
        self.terms
            .iter()
            .filter(|t| terms.contains(&t.term))
            .map(|t| t.surface.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub documents: usize,
    pub indexed_documents: usize,
    pub skipped_documents: usize,
    pub terms: usize,
    pub postings: usize,
}
