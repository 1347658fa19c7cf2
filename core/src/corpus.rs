//! Lazy loader for Washington Post style JSON-lines corpora.

use crate::{DocId, Document, Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use time::macros::format_description;
use time::OffsetDateTime;

lazy_static! {
    static ref TAG: Regex = Regex::new(r"<[^<]+?>").expect("valid regex");
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    /// Milliseconds since the epoch.
    #[serde(default)]
    published_date: Option<i64>,
    #[serde(default)]
    contents: Vec<Option<Block>>,
}

#[derive(Debug, Deserialize)]
struct Block {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    content: Option<serde_json::Value>,
}

/// Yields one [`Document`] per non-blank line, ids counting up from the start id.
pub struct WapoReader<R> {
    lines: Lines<R>,
    line_no: usize,
    next_id: DocId,
}

impl WapoReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?), 0))
    }
}

impl<R: BufRead> WapoReader<R> {
    pub fn new(reader: R, first_id: DocId) -> Self {
        Self { lines: reader.lines(), line_no: 0, next_id: first_id }
    }

    /// Id the next document will receive.
    pub fn next_id(&self) -> DocId {
        self.next_id
    }
}

impl<R: BufRead> Iterator for WapoReader<R> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let article: Article = match serde_json::from_str(&line) {
                Ok(a) => a,
                Err(source) => return Some(Err(Error::Json { line: self.line_no, source })),
            };
            let id = self.next_id;
            self.next_id += 1;
            return Some(Ok(to_document(id, article)));
        }
    }
}

fn to_document(id: DocId, article: Article) -> Document {
    let html: Vec<&str> = article
        .contents
        .iter()
        .flatten()
        .filter(|b| b.kind.as_deref() == Some("sanitized_html"))
        .filter_map(|b| b.content.as_ref().and_then(|c| c.as_str()))
        .collect();
    let content = TAG.replace_all(&html.join(" "), "").into_owned();
    Document {
        id,
        title: article.title.unwrap_or_default(),
        author: article.author.unwrap_or_default(),
        published_date: article.published_date.map(display_date).unwrap_or_default(),
        content,
    }
}

/// `YYYY/M/D` in UTC; out-of-range timestamps give an empty string.
pub fn display_date(millis: i64) -> String {
    let fmt = format_description!("[year]/[month padding:none]/[day padding:none]");
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
        .ok()
        .and_then(|dt| dt.format(&fmt).ok())
        .unwrap_or_default()
}

/// Read a whole corpus file into memory, keyed by doc id.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<HashMap<DocId, Document>> {
    let mut docs = HashMap::new();
    for doc in WapoReader::open(path)? {
        let doc = doc?;
        docs.insert(doc.id, doc);
    }
    tracing::info!(documents = docs.len(), "corpus loaded");
    Ok(docs)
}
