//! Error type shared by every operation in the crate.

use crate::DocId;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The embedded store could not be opened, read or written.
    #[error("storage error: {0}")]
    Store(#[from] sled::Error),

    /// A stored value failed to encode or decode.
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A corpus line was not a valid article record.
    #[error("malformed corpus record on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("store not found at {}", .0.display())]
    StoreNotFound(PathBuf),

    /// The postings store holds no terms, so idf is undefined.
    #[error("index not built: the postings store is empty")]
    IndexNotBuilt,

    #[error("cannot build an index from an empty corpus")]
    EmptyCorpus,

    /// A scored document has no vector norm; the two stores do not belong together.
    #[error("no vector norm stored for document {0}")]
    MissingNorm(DocId),
}
