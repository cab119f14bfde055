//! Cache store interface and an in-memory implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use offline_core::Response;

use crate::key::CacheKey;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to open a partition.
    #[error("failed to open partition {name}: {reason}")]
    Open { name: String, reason: String },

    /// Failed to serialize/deserialize a cache entry.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e.to_string())
    }
}

/// Durable store of named partitions.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Handle to a single partition.
    type Handle: CacheHandle;

    /// Open a partition, creating it if it does not exist.
    async fn open(&self, name: &str) -> CacheResult<Self::Handle>;

    /// Delete a partition and all its entries. Returns whether it existed.
    async fn delete(&self, name: &str) -> CacheResult<bool>;

    /// Names of every existing partition.
    async fn keys(&self) -> CacheResult<Vec<String>>;
}

/// Entries of one open partition.
#[async_trait]
pub trait CacheHandle: Send + Sync + 'static {
    /// Look up the response stored under `key`.
    async fn match_key(&self, key: &CacheKey) -> CacheResult<Option<Response>>;

    /// Store `response` under `key`, replacing any previous entry.
    async fn put(&self, key: &CacheKey, response: Response) -> CacheResult<()>;
}

type Entries = Arc<RwLock<HashMap<CacheKey, Response>>>;

/// In-memory cache store.
///
/// Safe for concurrent reads and writes; writes to the same key are
/// last-write-wins.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheStore {
    partitions: Arc<RwLock<BTreeMap<String, Entries>>>,
}

impl InMemoryCacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a partition, or `None` if it does not exist.
    pub fn entry_count(&self, name: &str) -> Option<usize> {
        let partitions = self.partitions.read().unwrap_or_else(PoisonError::into_inner);
        partitions
            .get(name)
            .map(|entries| entries.read().unwrap_or_else(PoisonError::into_inner).len())
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    type Handle = InMemoryCache;

    async fn open(&self, name: &str) -> CacheResult<InMemoryCache> {
        let mut partitions = self.partitions.write().unwrap_or_else(PoisonError::into_inner);
        let entries = partitions.entry(name.to_string()).or_default().clone();
        Ok(InMemoryCache { entries })
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let mut partitions = self.partitions.write().unwrap_or_else(PoisonError::into_inner);
        Ok(partitions.remove(name).is_some())
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        let partitions = self.partitions.read().unwrap_or_else(PoisonError::into_inner);
        Ok(partitions.keys().cloned().collect())
    }
}

/// Handle to one partition of an [`InMemoryCacheStore`].
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    entries: Entries,
}

#[async_trait]
impl CacheHandle for InMemoryCache {
    async fn match_key(&self, key: &CacheKey) -> CacheResult<Option<Response>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &CacheKey, response: Response) -> CacheResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.clone(), response);
        Ok(())
    }
}
