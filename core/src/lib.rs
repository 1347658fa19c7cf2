//! Disjunctive ranked retrieval over a log-tf/idf inverted index.
//!
//! Build once with [`build_index`] into two key-value stores (term → postings,
//! doc id → vector norm), then answer free-text queries with [`QueryEngine`].

pub mod builder;
pub mod corpus;
pub mod error;
mod index;
pub mod persist;
pub mod query;
pub mod tokenizer;
pub mod topk;

pub use builder::{build_index, build_index_at, IndexBuilder};
pub use error::{Error, Result};
pub use index::*;
pub use persist::{KvStore, MemoryStore, SledStore};
pub use query::{run_query, QueryEngine};
