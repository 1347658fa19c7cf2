use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tfidf_core::corpus::WapoReader;
use tfidf_core::{run_query, BuildStats, DocId, IndexBuilder, KvStore, QueryOutcome, SledStore};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a log-tf/idf inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the postings and norm stores from JSON-lines corpus files
    Build {
        /// Input path (a .jl/.jsonl file or a directory of them)
        #[arg(long)]
        input: String,
        /// Postings store location
        #[arg(long)]
        index: String,
        /// Norm store location, defaults to <index>_doc_len
        #[arg(long)]
        norms: Option<String>,
        /// Clear both stores before building
        #[arg(long, default_value_t = false)]
        clear: bool,
    },
    /// Run a query against a built index
    Query {
        #[arg(long)]
        index: String,
        #[arg(long)]
        norms: Option<String>,
        /// Number of results
        #[arg(short, default_value_t = 10)]
        k: usize,
        /// Print the outcome as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Query text
        #[arg(required = true)]
        text: Vec<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, index, norms, clear } => {
            let norms = norms_path(&index, norms);
            let report = build(Path::new(&input), Path::new(&index), &norms, clear)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Query { index, norms, k, json, text } => {
            let norms = norms_path(&index, norms);
            let text = text.join(" ");
            let outcome = run_query(&text, k, &index, &norms)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
            Ok(())
        }
    }
}

fn norms_path(index: &str, norms: Option<String>) -> PathBuf {
    PathBuf::from(norms.unwrap_or_else(|| format!("{index}_doc_len")))
}

/// Corpus files under `input`, sorted so doc ids are stable across runs.
fn corpus_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "jl" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

#[derive(Serialize)]
struct BuildReport {
    #[serde(flatten)]
    stats: BuildStats,
    files: usize,
    took_s: f64,
}

fn build(input: &Path, index: &Path, norms: &Path, clear: bool) -> Result<BuildReport> {
    let start = Instant::now();
    let files = corpus_files(input);
    if files.is_empty() {
        bail!("no corpus files found at {}", input.display());
    }

    let postings = SledStore::open_for_write(index)?;
    let norm_store = SledStore::open_for_write(norms)?;
    if clear {
        postings.clear()?;
        norm_store.clear()?;
    } else if !postings.is_empty()? {
        tracing::warn!(index = %index.display(), "building into a non-empty store; stale entries will remain");
    }

    let mut builder = IndexBuilder::new(&postings, &norm_store);
    let mut next_id: DocId = 0;
    for file in &files {
        tracing::info!(file = %file.display(), first_id = next_id, "ingesting");
        let mut reader = WapoReader::new(std::io::BufReader::new(std::fs::File::open(file)?), next_id);
        for doc in reader.by_ref() {
            builder.add_document(&doc?)?;
        }
        next_id = reader.next_id();
    }
    let stats = builder.finish()?;

    Ok(BuildReport { stats, files: files.len(), took_s: start.elapsed().as_secs_f64() })
}

fn print_outcome(outcome: &QueryOutcome) {
    for t in &outcome.terms {
        println!("{} ({}) idf={:.4} df={}", t.surface, t.term, t.idf, t.df);
    }
    if !outcome.stopwords.is_empty() {
        println!("stopwords: {}", outcome.stopwords.join(" "));
    }
    if !outcome.unknown.is_empty() {
        println!("unknown: {}", outcome.unknown.join(" "));
    }
    println!("{} of {} matching documents", outcome.hits.len(), outcome.total_hits);
    for (rank, hit) in outcome.hits.iter().enumerate() {
        println!("{:>4}. doc {:<8} {:.4}  [{}]", rank + 1, hit.doc_id, hit.score, outcome.matched_surfaces(hit.doc_id).join(" "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use tfidf_core::QueryEngine;

    #[test]
    fn builds_across_files_with_continuing_ids() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        fs::create_dir_all(&corpus).unwrap();
        fs::write(corpus.join("a.jl"), "{\"title\": \"Cats\", \"contents\": [{\"type\": \"sanitized_html\", \"content\": \"cat sat\"}]}\n").unwrap();
        fs::write(
            corpus.join("b.jsonl"),
            "{\"title\": \"Dogs\", \"contents\": [{\"type\": \"sanitized_html\", \"content\": \"dog sat\"}]}\n",
        )
        .unwrap();
        fs::write(corpus.join("notes.txt"), "ignored").unwrap();

        let index = dir.path().join("idx");
        let norms = norms_path(index.to_str().unwrap(), None);
        let report = build(&corpus, &index, &norms, true).unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.stats.documents, 2);

        let (p, n) = (SledStore::open_for_read(&index).unwrap(), SledStore::open_for_read(&norms).unwrap());
        let outcome = QueryEngine::new(&p, &n).unwrap().query("dog", 5).unwrap();
        assert_eq!(outcome.hits.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn rebuild_keeps_stale_terms_unless_cleared() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("wapo.jl");
        let index = dir.path().join("idx");
        let norms = norms_path(index.to_str().unwrap(), None);

        let line = |content: &str| format!("{{\"title\": \"\", \"contents\": [{{\"type\": \"sanitized_html\", \"content\": \"{content}\"}}]}}\n");
        fs::write(&corpus, line("cat sat") + &line("owl hoot")).unwrap();
        build(&corpus, &index, &norms, false).unwrap();

        fs::write(&corpus, line("dog sat")).unwrap();
        build(&corpus, &index, &norms, false).unwrap();
        {
            let (p, n) = (SledStore::open_for_read(&index).unwrap(), SledStore::open_for_read(&norms).unwrap());
            assert!(p.contains_key("cat").unwrap());
            assert!(p.contains_key("dog").unwrap());
            assert!(n.contains_key("1").unwrap());
        }

        build(&corpus, &index, &norms, true).unwrap();
        let (p, n) = (SledStore::open_for_read(&index).unwrap(), SledStore::open_for_read(&norms).unwrap());
        assert!(!p.contains_key("cat").unwrap());
        assert!(p.contains_key("dog").unwrap());
        assert_eq!(p.len().unwrap(), 2);
        assert_eq!(n.len().unwrap(), 1);
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempdir().unwrap();
        let index = dir.path().join("idx");
        assert!(build(&dir.path().join("none"), &index, &dir.path().join("n"), false).is_err());
    }
}
