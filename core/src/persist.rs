//! Key-value persistence for the postings and norm stores.
//!
//! Keys are strings, values are any serde type encoded with bincode. The
//! builder writes through [`KvStore::put`]; the query engine only reads.

use crate::{Error, Result};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub trait KvStore: Send + Sync {
    fn get<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>>;
    fn put<V: Serialize>(&self, key: &str, value: &V) -> Result<()>;
    fn contains_key(&self, key: &str) -> Result<bool>;
    /// Number of keys in the store.
    fn len(&self) -> Result<usize>;
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
    fn clear(&self) -> Result<()>;
    fn flush(&self) -> Result<()>;
}

/// Durable store backed by an embedded sled database.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open or create the store at `path`.
    pub fn open_for_write<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an existing store. A missing path is an error rather than a new empty store.
    pub fn open_for_read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(Error::StoreNotFound(path));
        }
        let db = sled::open(&path)?;
        Ok(Self { db })
    }
}

impl KvStore for SledStore {
    fn get<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put<V: Serialize>(&self, key: &str, value: &V) -> Result<()> {
        let bytes = bincode::serialize(value)?;
        self.db.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.db.contains_key(key.as_bytes())?)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.db.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.db.is_empty())
    }

    fn clear(&self) -> Result<()> {
        self.db.clear()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

/// In-process store using the same value encoding as [`SledStore`].
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

impl KvStore for MemoryStore {
    fn get<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>> {
        match self.entries.read().get(key) {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    fn put<V: Serialize>(&self, key: &str, value: &V) -> Result<()> {
        let bytes = bincode::serialize(value)?;
        self.entries.write().insert(key.to_string(), bytes);
        Ok(())
    }

    fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.entries.read().contains_key(key))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Norms are keyed by the decimal doc id.
pub fn norm_key(doc_id: crate::DocId) -> String {
    doc_id.to_string()
}
