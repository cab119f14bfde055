//! Directory-backed cache store.
//!
//! Each partition is a subdirectory of the root and each entry one JSON file
//! named by the SHA-256 of its cache key. Partition names are read back from
//! the directory listing, so concurrent opens never lose each other's names.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use offline_core::Response;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::key::CacheKey;
use crate::store::{CacheError, CacheHandle, CacheResult, CacheStore};
use crate::stored::StoredResponse;

static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    response: StoredResponse,
}

fn storage(context: impl std::fmt::Display, e: std::io::Error) -> CacheError {
    CacheError::Storage(format!("{}: {}", context, e))
}

/// Cache store persisted under a root directory.
#[derive(Debug, Clone)]
pub struct DirCacheStore {
    root: PathBuf,
}

impl DirCacheStore {
    /// Create a store rooted at `root`. The directory is created on first open.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition_dir(&self, name: &str) -> CacheResult<PathBuf> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\'])
            && Path::new(name).file_name().is_some_and(|n| n == name);
        if !valid {
            return Err(CacheError::Open {
                name: name.to_string(),
                reason: "not a valid partition directory name".into(),
            });
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl CacheStore for DirCacheStore {
    type Handle = DirCache;

    async fn open(&self, name: &str) -> CacheResult<DirCache> {
        let dir = self.partition_dir(name)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::Open {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(DirCache {
            name: name.to_string(),
            dir,
        })
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let dir = self.partition_dir(name)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!(partition = %name, "removed partition directory");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage(format!("removing {}", dir.display()), e)),
        }
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage(format!("reading {}", self.root.display()), e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| storage("reading store directory", e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| storage("reading entry type", e))?;
            if !file_type.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            match file_name.to_str() {
                Some(name) if !name.starts_with('.') => names.push(name.to_string()),
                _ => {}
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Handle to one partition of a [`DirCacheStore`].
#[derive(Debug, Clone)]
pub struct DirCache {
    name: String,
    dir: PathBuf,
}

impl DirCache {
    fn entry_file(&self, key: &CacheKey) -> String {
        hex::encode(Sha256::digest(key.as_str().as_bytes()))
    }
}

#[async_trait]
impl CacheHandle for DirCache {
    async fn match_key(&self, key: &CacheKey) -> CacheResult<Option<Response>> {
        let path = self.dir.join(format!("{}.json", self.entry_file(key)));
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage(format!("reading {}", path.display()), e)),
        };

        let entry: StoredEntry = serde_json::from_slice(&bytes)?;
        if entry.key != key.as_str() {
            return Ok(None);
        }
        Ok(Some(entry.response.into_response()?))
    }

    async fn put(&self, key: &CacheKey, response: Response) -> CacheResult<()> {
        let file = self.entry_file(key);
        let entry = StoredEntry {
            key: key.as_str().to_string(),
            response: StoredResponse::from_response(&response),
        };
        let content = serde_json::to_vec(&entry)?;

        // Write then rename so readers never see a partial entry.
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!(".{}.{}.{}.tmp", file, std::process::id(), seq));
        let path = self.dir.join(format!("{}.json", file));

        fs::write(&tmp, content)
            .await
            .map_err(|e| storage(format!("writing {} in {}", key, self.name), e))?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(storage(format!("committing {} in {}", key, self.name), e));
        }
        Ok(())
    }
}
