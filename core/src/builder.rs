//! Batch construction of the postings and norm stores.

use crate::persist::{norm_key, KvStore, SledStore};
use crate::tokenizer::{get_normalized_tokens, tf};
use crate::{BuildStats, DocId, Document, Error, Posting, Result};
use std::path::Path;
use std::time::Instant;

/// Accumulates (term, doc, weight) triples while writing each document's norm
/// as soon as it is seen; [`IndexBuilder::finish`] groups and writes postings.
///
/// The stores are not cleared first: building into a populated store mixes
/// old and new entries.
pub struct IndexBuilder<'a, P: KvStore, N: KvStore> {
    postings: &'a P,
    norms: &'a N,
    triples: Vec<(String, DocId, f64)>,
    stats: BuildStats,
    started: Instant,
}

impl<'a, P: KvStore, N: KvStore> IndexBuilder<'a, P, N> {
    pub fn new(postings: &'a P, norms: &'a N) -> Self {
        Self { postings, norms, triples: Vec::new(), stats: BuildStats::default(), started: Instant::now() }
    }

    pub fn add_document(&mut self, doc: &Document) -> Result<()> {
        self.stats.documents += 1;
        let tokens = get_normalized_tokens(&doc.title, &doc.content);
        if tokens.is_empty() {
            self.stats.skipped_documents += 1;
            tracing::debug!(doc_id = doc.id, "document has no indexable terms");
            return Ok(());
        }

        let mut weights: Vec<f64> = Vec::new();
        for (term, count) in runs(tokens) {
            let weight = tf(count);
            weights.push(weight);
            self.triples.push((term, doc.id, weight));
        }
        self.norms.put(&norm_key(doc.id), &vector_norm(&weights))?;
        self.stats.indexed_documents += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<BuildStats> {
        if self.stats.documents == 0 {
            return Err(Error::EmptyCorpus);
        }
        // stable: postings keep ingestion order within a term
        self.triples.sort_by(|a, b| a.0.cmp(&b.0));
        self.stats.postings = self.triples.len();

        let mut iter = self.triples.into_iter().peekable();
        while let Some((term, doc_id, weight)) = iter.next() {
            let mut list = vec![Posting { doc_id, weight }];
            while let Some((_, doc_id, weight)) = iter.next_if(|next| next.0 == term) {
                list.push(Posting { doc_id, weight });
            }
            self.postings.put(&term, &list)?;
            self.stats.terms += 1;
        }
        self.postings.flush()?;
        self.norms.flush()?;

        let stats = self.stats;
        tracing::info!(
            documents = stats.documents,
            indexed = stats.indexed_documents,
            skipped = stats.skipped_documents,
            terms = stats.terms,
            postings = stats.postings,
            elapsed_s = self.started.elapsed().as_secs_f64(),
            "index build complete"
        );
        Ok(stats)
    }
}

/// Run-length groups a sorted token list into (term, count) pairs.
fn runs(tokens: Vec<String>) -> Vec<(String, u32)> {
    let mut out: Vec<(String, u32)> = Vec::new();
    for token in tokens {
        match out.last_mut() {
            Some((last, count)) if *last == token => *count += 1,
            _ => out.push((token, 1)),
        }
    }
    out
}

pub fn vector_norm(weights: &[f64]) -> f64 {
    weights.iter().map(|w| w * w).sum::<f64>().sqrt()
}

/// Build both stores from a finite stream of documents.
pub fn build_index<I, P, N>(documents: I, postings: &P, norms: &N) -> Result<BuildStats>
where
    I: IntoIterator<Item = Document>,
    P: KvStore,
    N: KvStore,
{
    let mut builder = IndexBuilder::new(postings, norms);
    for doc in documents {
        builder.add_document(&doc)?;
    }
    builder.finish()
}

/// [`build_index`] into sled stores at the given locations.
pub fn build_index_at<I, A, B>(documents: I, postings_path: A, norms_path: B) -> Result<BuildStats>
where
    I: IntoIterator<Item = Document>,
    A: AsRef<Path>,
    B: AsRef<Path>,
{
    let postings = SledStore::open_for_write(postings_path)?;
    let norms = SledStore::open_for_write(norms_path)?;
    build_index(documents, &postings, &norms)
}
