//! Disjunctive cosine-similarity queries.

use crate::persist::{norm_key, KvStore, SledStore};
use crate::tokenizer::{idf, normalize, tf};
use crate::{topk, DocId, Error, Posting, QueryOutcome, QueryTerm, Result};
use std::collections::HashMap;
use std::path::Path;

/// Answers queries against a built index. Holds shared references only, so
/// one engine can serve any number of concurrent queries.
///
/// The term count used as N for idf is read once when the engine is created;
/// the stores must not change while it is alive.
pub struct QueryEngine<'a, P: KvStore, N: KvStore> {
    postings: &'a P,
    norms: &'a N,
    term_count: usize,
}

/// Query words sorted into known terms, stopwords and unknown words.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedQuery {
    /// (surface word, term, count in query), in first-occurrence order.
    pub known: Vec<(String, String, u32)>,
    pub stopwords: Vec<String>,
    pub unknown: Vec<String>,
}

impl<'a, P: KvStore, N: KvStore> QueryEngine<'a, P, N> {
    pub fn new(postings: &'a P, norms: &'a N) -> Result<Self> {
        let term_count = postings.len()?;
        Ok(Self::with_term_count(postings, norms, term_count))
    }

    /// Reuse a term count taken earlier from the same postings store.
    pub fn with_term_count(postings: &'a P, norms: &'a N, term_count: usize) -> Self {
        Self { postings, norms, term_count }
    }

    pub fn term_count(&self) -> usize {
        self.term_count
    }

    pub fn parse(&self, text: &str) -> Result<ParsedQuery> {
        let mut parsed = ParsedQuery::default();
        for word in text.split_whitespace() {
            let term = normalize(word);
            if term.is_empty() {
                parsed.stopwords.push(word.to_string());
            } else if let Some(entry) = parsed.known.iter_mut().find(|(_, t, _)| *t == term) {
                entry.2 += 1;
            } else if self.postings.contains_key(&term)? {
                parsed.known.push((word.to_string(), term, 1));
            } else {
                parsed.unknown.push(word.to_string());
            }
        }
        Ok(parsed)
    }

    /// Rank documents for `text`, returning at most `k` hits.
    ///
    /// Each known term contributes `doc_weight * idf * (tf_q * idf)` to every
    /// document in its postings list, where N for idf is the number of terms
    /// in the postings store. Sums are divided by the document's vector norm;
    /// the query norm is left out since it does not change the ranking.
    pub fn query(&self, text: &str, k: usize) -> Result<QueryOutcome> {
        if text.trim().is_empty() {
            return Ok(QueryOutcome::default());
        }
        let n = self.term_count;
        if n == 0 {
            return Err(Error::IndexNotBuilt);
        }
        let parsed = self.parse(text)?;

        let mut terms: Vec<QueryTerm> = Vec::with_capacity(parsed.known.len());
        let mut doc_scores: HashMap<DocId, f64> = HashMap::new();
        let mut doc_terms: HashMap<DocId, Vec<usize>> = HashMap::new();
        for (surface, term, query_count) in parsed.known {
            let postings: Vec<Posting> = self.postings.get(&term)?.unwrap_or_default();
            if postings.is_empty() {
                continue;
            }
            let df = postings.len();
            let idf = idf(n, df);
            let weight = tf(query_count) * idf;
            for p in &postings {
                *doc_scores.entry(p.doc_id).or_insert(0.0) += p.weight * idf * weight;
                doc_terms.entry(p.doc_id).or_default().push(terms.len());
            }
            terms.push(QueryTerm { surface, term, query_count, df, idf, weight });
        }

        for (doc_id, score) in doc_scores.iter_mut() {
            if *score != 0.0 {
                let norm: f64 = self.norms.get(&norm_key(*doc_id))?.ok_or(Error::MissingNorm(*doc_id))?;
                *score /= norm;
            }
        }

        let total_hits = doc_scores.len();
        let hits = topk::select(doc_scores, k);
        let matches: HashMap<DocId, Vec<String>> = hits
            .iter()
            .map(|hit| {
                let matched: Vec<String> = doc_terms
                    .remove(&hit.doc_id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|i| terms[i].term.clone())
                    .collect();
                (hit.doc_id, matched)
            })
            .collect();
        tracing::debug!(query = text, known = terms.len(), total_hits, returned = hits.len(), "query complete");

        Ok(QueryOutcome { hits, stopwords: parsed.stopwords, unknown: parsed.unknown, terms, matches, total_hits })
    }
}

/// Open the sled stores at the given locations and run one query.
pub fn run_query<A: AsRef<Path>, B: AsRef<Path>>(text: &str, k: usize, postings_path: A, norms_path: B) -> Result<QueryOutcome> {
    let postings = SledStore::open_for_read(postings_path)?;
    let norms = SledStore::open_for_read(norms_path)?;
    QueryEngine::new(&postings, &norms)?.query(text, k)
}
