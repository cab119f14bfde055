//! Shared fakes for worker behavior tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use offline_cache::{CacheError, CacheHandle, CacheKey, CacheResult, CacheStore, InMemoryCache, InMemoryCacheStore};
use offline_core::{RequestDescriptor, RequestMode, Response, WorkerConfig};
use offline_fetch::{FetchError, Fetcher};
use offline_worker::{HostControl, LifecycleResult, OfflineWorker};

pub const ORIGIN: &str = "http://localhost:8080";

/// Fetcher answering from a path table. Unknown paths and offline mode fail
/// with a network error.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, Response>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl ScriptedFetcher {
    pub fn route(&self, path: &str, response: Response) {
        self.routes.lock().unwrap().insert(path.to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<Response, FetchError> {
        let path = request.path().to_string();
        self.calls.lock().unwrap().push(path.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Network("offline".into()));
        }
        self.routes
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .ok_or_else(|| FetchError::Network(format!("no route for {}", path)))
    }
}

#[derive(Debug, Default)]
struct Faults {
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

/// In-memory store with switchable read and write failures.
#[derive(Debug, Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryCacheStore,
    faults: Arc<Faults>,
}

impl FlakyStore {
    pub fn fail_reads(&self, fail: bool) {
        self.faults.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.faults.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn entry_count(&self, name: &str) -> Option<usize> {
        self.inner.entry_count(name)
    }

    pub async fn get(&self, partition: &str, path: &str) -> Option<Response> {
        let cache = self.inner.open(partition).await.unwrap();
        cache.match_key(&CacheKey::for_request(&get(path))).await.unwrap()
    }

    pub async fn keys_empty(&self) -> bool {
        self.inner.keys().await.unwrap().is_empty()
    }

    pub async fn seed(&self, partition: &str, path: &str, response: Response) {
        let cache = self.inner.open(partition).await.unwrap();
        cache.put(&CacheKey::for_request(&get(path)), response).await.unwrap();
    }
}

#[async_trait]
impl CacheStore for FlakyStore {
    type Handle = FlakyHandle;

    async fn open(&self, name: &str) -> CacheResult<FlakyHandle> {
        Ok(FlakyHandle {
            inner: self.inner.open(name).await?,
            faults: self.faults.clone(),
        })
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        self.inner.delete(name).await
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        self.inner.keys().await
    }
}

pub struct FlakyHandle {
    inner: InMemoryCache,
    faults: Arc<Faults>,
}

#[async_trait]
impl CacheHandle for FlakyHandle {
    async fn match_key(&self, key: &CacheKey) -> CacheResult<Option<Response>> {
        if self.faults.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Storage("read failed".into()));
        }
        self.inner.match_key(key).await
    }

    async fn put(&self, key: &CacheKey, response: Response) -> CacheResult<()> {
        if self.faults.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Storage("quota exceeded".into()));
        }
        self.inner.put(key, response).await
    }
}

/// Host that counts control calls.
#[derive(Default)]
pub struct RecordingHost {
    pub skip_waiting: AtomicUsize,
    pub claim_clients: AtomicUsize,
}

#[async_trait]
impl HostControl for RecordingHost {
    async fn skip_waiting(&self) -> LifecycleResult<()> {
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn claim_clients(&self) -> LifecycleResult<()> {
        self.claim_clients.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub type TestWorker = OfflineWorker<FlakyStore, ScriptedFetcher, RecordingHost>;

pub struct Harness {
    pub worker: TestWorker,
    pub store: FlakyStore,
    pub fetcher: Arc<ScriptedFetcher>,
    pub host: Arc<RecordingHost>,
}

pub fn harness(config: WorkerConfig) -> Harness {
    harness_with_store(config, FlakyStore::default())
}

pub fn harness_with_store(config: WorkerConfig, store: FlakyStore) -> Harness {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let host = Arc::new(RecordingHost::default());
    let worker = OfflineWorker::new(config, Arc::new(store.clone()), fetcher.clone(), host.clone())
        .unwrap();
    Harness {
        worker,
        store,
        fetcher,
        host,
    }
}

/// Route every manifest path of `config` to a 200.
pub fn route_manifest(fetcher: &ScriptedFetcher, config: &WorkerConfig) {
    for path in config.app_shell_assets.iter().chain(config.font_assets.iter()) {
        fetcher.route(path, Response::ok(format!("precached {}", path)));
    }
}

pub fn get(path: &str) -> RequestDescriptor {
    RequestDescriptor::parse(&format!("{}{}", ORIGIN, path)).unwrap()
}

pub fn navigate(path: &str) -> RequestDescriptor {
    get(path).with_mode(RequestMode::Navigate)
}

pub fn cache_control(response: &Response) -> Option<&str> {
    response.header_str("cache-control")
}
