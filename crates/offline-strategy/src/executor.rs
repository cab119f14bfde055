//! Strategy execution.
//!
//! One function per [`Algorithm`]. Every path produces exactly one response;
//! cache-store failures are logged and treated as a miss or a dropped write,
//! never surfaced to the caller.

use std::sync::Arc;

use offline_cache::{decorate, CacheHandle, CacheKey, CacheStore, PartitionKind, PartitionRegistry};
use offline_core::{RequestDescriptor, Response, WorkerConfig};
use offline_fetch::{FetchError, Fetcher};
use tokio::sync::oneshot;

use crate::background::BackgroundTasks;
use crate::classifier::{Algorithm, StrategyClass};
use crate::fallback::{offline_json, offline_text};

/// Executes caching strategies against a store and a fetcher.
///
/// Background writes and revalidations are spawned on the ambient tokio
/// runtime. Without one, responses are still produced but nothing is
/// persisted in the background and a stale-while-revalidate miss yields the
/// offline error.
pub struct StrategyExecutor<S, F> {
    store: Arc<S>,
    fetcher: Arc<F>,
    config: Arc<WorkerConfig>,
    registry: PartitionRegistry,
    background: BackgroundTasks,
}

impl<S, F> Clone for StrategyExecutor<S, F> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            fetcher: self.fetcher.clone(),
            config: self.config.clone(),
            registry: self.registry.clone(),
            background: self.background.clone(),
        }
    }
}

impl<S: CacheStore, F: Fetcher> StrategyExecutor<S, F> {
    /// Create an executor. Partition names follow `config.cache_version`.
    pub fn new(store: Arc<S>, fetcher: Arc<F>, config: Arc<WorkerConfig>) -> Self {
        let registry = PartitionRegistry::new(config.cache_version.clone());
        Self {
            store,
            fetcher,
            config,
            registry,
            background: BackgroundTasks::new(),
        }
    }

    /// Background work spawned by this executor.
    pub fn background(&self) -> &BackgroundTasks {
        &self.background
    }

    /// The partition registry in use.
    pub fn registry(&self) -> &PartitionRegistry {
        &self.registry
    }

    /// Produce the response for `request` using the strategy of `class`.
    pub async fn execute(&self, request: &RequestDescriptor, class: StrategyClass) -> Response {
        match (class.algorithm(), class.partition()) {
            (Algorithm::NetworkOnly, _) => self.network_only(request).await,
            (Algorithm::NetworkFirst, Some(kind)) => self.network_first(request, kind).await,
            (Algorithm::CacheFirst, Some(kind)) => self.cache_first(request, kind).await,
            (Algorithm::StaleWhileRevalidate, Some(kind)) => {
                self.stale_while_revalidate(request, kind).await
            }
            (algorithm, None) => {
                tracing::error!(%class, ?algorithm, "strategy has no partition, serving offline error");
                offline_text()
            }
        }
    }

    /// Network only. A failed fetch yields the structured offline error.
    pub async fn network_only(&self, request: &RequestDescriptor) -> Response {
        match self.fetcher.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "network-only fetch failed");
                offline_json()
            }
        }
    }

    /// Network first, cached copy on failure.
    ///
    /// Successful responses are persisted in the background and returned
    /// undecorated.
    pub async fn network_first(&self, request: &RequestDescriptor, kind: PartitionKind) -> Response {
        let key = CacheKey::for_request(request);

        let error = match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.persist_detached(kind, key, response.clone());
                }
                return response;
            }
            Err(e) => e,
        };
        tracing::debug!(error = %error, "network-first fetch failed, trying cache");

        if let Some(cached) = self.lookup(kind, &key).await {
            return decorate(&cached, self.config.freshness.short_secs);
        }

        self.offline_fallback(request).await
    }

    /// Cache first, network on miss.
    ///
    /// A fetched 2xx is written before returning. The fetched response is
    /// decorated whatever its status.
    pub async fn cache_first(&self, request: &RequestDescriptor, kind: PartitionKind) -> Response {
        let key = CacheKey::for_request(request);
        let max_age = self.config.freshness.long_secs;

        if let Some(cached) = self.lookup(kind, &key).await {
            tracing::debug!(partition = %kind, "cache hit");
            return decorate(&cached, max_age);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    write_entry(&*self.store, &self.registry.physical_name(kind), &key, response.clone())
                        .await;
                }
                decorate(&response, max_age)
            }
            Err(e) => {
                tracing::debug!(error = %e, "cache-first fetch failed");
                self.offline_fallback(request).await
            }
        }
    }

    /// Serve the cached copy now and refresh it in the background.
    ///
    /// On a miss the caller waits for the background fetch instead.
    pub async fn stale_while_revalidate(
        &self,
        request: &RequestDescriptor,
        kind: PartitionKind,
    ) -> Response {
        let key = CacheKey::for_request(request);
        let max_age = self.config.freshness.medium_secs;
        let cached = self.lookup(kind, &key).await;

        let revalidation = self.revalidate(request.clone(), kind, key);

        match cached {
            Some(cached) => decorate(&cached, max_age),
            None => match revalidation.await {
                Ok(Ok(response)) => decorate(&response, max_age),
                Ok(Err(_)) | Err(_) => offline_text(),
            },
        }
    }

    /// Spawn a background fetch that overwrites the entry on success.
    ///
    /// The receiver yields the fetch result once the write has settled; it
    /// may be dropped.
    fn revalidate(
        &self,
        request: RequestDescriptor,
        kind: PartitionKind,
        key: CacheKey,
    ) -> oneshot::Receiver<Result<Response, FetchError>> {
        let (tx, rx) = oneshot::channel();
        let store = self.store.clone();
        let fetcher = self.fetcher.clone();
        let name = self.registry.physical_name(kind);

        self.background.spawn(async move {
            let result = fetcher.fetch(&request).await;
            match &result {
                Ok(response) if response.is_success() => {
                    write_entry(&*store, &name, &key, response.clone()).await;
                }
                Ok(response) => {
                    tracing::debug!(status = %response.status(), key = %key, "revalidation not cached");
                }
                Err(e) => {
                    tracing::debug!(error = %e, key = %key, "revalidation failed");
                }
            }
            let _ = tx.send(result);
        });

        rx
    }

    /// Last resort for a failed fetch: the app shell for navigations, then
    /// the plain offline error.
    async fn offline_fallback(&self, request: &RequestDescriptor) -> Response {
        if request.is_navigation() {
            if let Some(shell) = self.shell_document(request).await {
                return shell;
            }
        }
        offline_text()
    }

    /// The cached shell document on the request's origin.
    async fn shell_document(&self, request: &RequestDescriptor) -> Option<Response> {
        let shell = match request.same_origin(&self.config.shell_document) {
            Ok(shell) => shell,
            Err(e) => {
                tracing::warn!(error = %e, document = %self.config.shell_document, "invalid shell document path");
                return None;
            }
        };
        self.lookup(PartitionKind::AppShell, &CacheKey::for_request(&shell))
            .await
    }

    /// Look up `key` in a partition. Store failures count as a miss.
    async fn lookup(&self, kind: PartitionKind, key: &CacheKey) -> Option<Response> {
        let name = self.registry.physical_name(kind);
        let handle = match self.store.open(&name).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(partition = %name, error = %e, "failed to open partition");
                return None;
            }
        };
        match handle.match_key(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(partition = %name, key = %key, error = %e, "cache lookup failed");
                None
            }
        }
    }

    fn persist_detached(&self, kind: PartitionKind, key: CacheKey, response: Response) {
        let store = self.store.clone();
        let name = self.registry.physical_name(kind);
        self.background.spawn(async move {
            write_entry(&*store, &name, &key, response).await;
        });
    }
}

/// Write one entry. Failures are logged and dropped.
async fn write_entry<S: CacheStore>(store: &S, name: &str, key: &CacheKey, response: Response) {
    let handle = match store.open(name).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(partition = %name, error = %e, "failed to open partition for write");
            return;
        }
    };
    match handle.put(key, response).await {
        Ok(()) => tracing::debug!(partition = %name, key = %key, "cached"),
        Err(e) => tracing::warn!(partition = %name, key = %key, error = %e, "cache write failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use http::header::{HeaderValue, CACHE_CONTROL, ETAG};
    use offline_cache::InMemoryCacheStore;
    use offline_core::{RequestMode, StatusCode};

    #[derive(Default)]
    struct ScriptedFetcher {
        responses: Mutex<HashMap<String, Response>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn respond(&self, path: &str, response: Response) {
            self.responses
                .lock()
                .unwrap()
                .insert(path.to_string(), response);
        }

        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, request: &RequestDescriptor) -> Result<Response, FetchError> {
            let path = request.path().to_string();
            self.calls.lock().unwrap().push(path.clone());
            self.responses
                .lock()
                .unwrap()
                .get(&path)
                .cloned()
                .ok_or_else(|| FetchError::Network(format!("unreachable: {}", path)))
        }
    }

    fn setup() -> (
        StrategyExecutor<InMemoryCacheStore, ScriptedFetcher>,
        InMemoryCacheStore,
        Arc<ScriptedFetcher>,
    ) {
        let store = InMemoryCacheStore::new();
        let fetcher = Arc::new(ScriptedFetcher::default());
        let executor = StrategyExecutor::new(
            Arc::new(store.clone()),
            fetcher.clone(),
            Arc::new(WorkerConfig::default()),
        );
        (executor, store, fetcher)
    }

    fn req(path: &str) -> RequestDescriptor {
        RequestDescriptor::parse(&format!("https://example.com{}", path)).unwrap()
    }

    async fn seed(store: &InMemoryCacheStore, partition: &str, path: &str, response: Response) {
        let cache = store.open(partition).await.unwrap();
        cache.put(&CacheKey::for_request(&req(path)), response).await.unwrap();
    }

    async fn cached(store: &InMemoryCacheStore, partition: &str, path: &str) -> Option<Response> {
        let cache = store.open(partition).await.unwrap();
        cache.match_key(&CacheKey::for_request(&req(path))).await.unwrap()
    }

    fn cache_control(response: &Response) -> Option<&str> {
        response.header_str(CACHE_CONTROL.as_str())
    }

    // === Network Only ===

    #[tokio::test]
    async fn test_network_only_passes_error_status_through() {
        let (executor, store, fetcher) = setup();
        fetcher.respond("/api/x", Response::with_status(StatusCode::NOT_FOUND, "nope"));

        let resp = executor.execute(&req("/api/x"), StrategyClass::NetworkOnly).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(cache_control(&resp).is_none());
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_network_only_offline() {
        let (executor, store, _) = setup();
        let resp = executor.execute(&req("/api/x"), StrategyClass::NetworkOnly).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.content_type(), Some("application/json"));
        assert!(store.keys().await.unwrap().is_empty());
    }

    // === Network First ===

    #[tokio::test]
    async fn test_network_first_returns_original_and_persists() {
        let (executor, store, fetcher) = setup();
        let original = Response::ok("fresh").header(ETAG, HeaderValue::from_static("\"1\""));
        fetcher.respond("/chat", original.clone());

        let resp = executor.execute(&req("/chat"), StrategyClass::DefaultNetworkFirst).await;
        assert_eq!(resp, original);

        executor.background().drain().await;
        let stored = cached(&store, "static-assets-v2", "/chat").await.unwrap();
        assert_eq!(stored.body(), b"fresh");
    }

    #[tokio::test]
    async fn test_network_first_does_not_cache_errors() {
        let (executor, store, fetcher) = setup();
        fetcher.respond("/chat", Response::with_status(StatusCode::INTERNAL_SERVER_ERROR, "x"));

        let resp = executor.execute(&req("/chat"), StrategyClass::DefaultNetworkFirst).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        executor.background().drain().await;
        assert!(cached(&store, "static-assets-v2", "/chat").await.is_none());
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache() {
        let (executor, store, _) = setup();
        seed(&store, "static-assets-v2", "/chat", Response::ok("stale")).await;

        let resp = executor.execute(&req("/chat"), StrategyClass::DefaultNetworkFirst).await;
        assert_eq!(resp.body(), b"stale");
        assert_eq!(cache_control(&resp), Some("public, max-age=3600, immutable"));
    }

    #[tokio::test]
    async fn test_network_first_shell_only_for_navigation() {
        let (executor, store, _) = setup();
        seed(&store, "app-shell-v2", "/index.html", Response::ok("<shell>")).await;

        let nav = req("/chat/7").with_mode(RequestMode::Navigate);
        let resp = executor.execute(&nav, StrategyClass::NavigationNetworkFirst).await;
        assert_eq!(resp.body(), b"<shell>");
        assert!(cache_control(&resp).is_none());

        let sub = executor.execute(&req("/chat/7"), StrategyClass::DefaultNetworkFirst).await;
        assert_eq!(sub.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(sub.text(), "Offline");
    }

    // === Cache First ===

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let (executor, store, fetcher) = setup();
        seed(&store, "fonts-v2", "/f.woff2", Response::ok("font")).await;

        let resp = executor.execute(&req("/f.woff2"), StrategyClass::FontCacheFirst).await;
        assert_eq!(resp.body(), b"font");
        assert_eq!(cache_control(&resp), Some("public, max-age=31536000, immutable"));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_first_miss_writes_before_returning() {
        let (executor, store, fetcher) = setup();
        fetcher.respond("/app-a1b2c3d4.js", Response::ok("js"));

        let resp = executor
            .execute(&req("/app-a1b2c3d4.js"), StrategyClass::HashedAssetCacheFirst)
            .await;
        assert_eq!(cache_control(&resp), Some("public, max-age=31536000, immutable"));
        assert!(cached(&store, "static-assets-v2", "/app-a1b2c3d4.js").await.is_some());
    }

    #[tokio::test]
    async fn test_cache_first_decorates_error_without_caching() {
        let (executor, store, fetcher) = setup();
        fetcher.respond("/gone-a1b2c3d4.js", Response::with_status(StatusCode::NOT_FOUND, ""));

        let resp = executor
            .execute(&req("/gone-a1b2c3d4.js"), StrategyClass::HashedAssetCacheFirst)
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(cache_control(&resp), Some("public, max-age=31536000, immutable"));
        assert!(cached(&store, "static-assets-v2", "/gone-a1b2c3d4.js").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_first_offline_miss() {
        let (executor, _, _) = setup();
        let resp = executor.execute(&req("/f.woff2"), StrategyClass::FontCacheFirst).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.text(), "Offline");
    }

    // === Stale While Revalidate ===

    #[tokio::test]
    async fn test_swr_hit_serves_stale_then_refreshes() {
        let (executor, store, fetcher) = setup();
        seed(&store, "static-assets-v2", "/app.css", Response::ok("v1")).await;
        fetcher.respond("/app.css", Response::ok("v2"));

        let resp = executor.execute(&req("/app.css"), StrategyClass::RevalidateAsset).await;
        assert_eq!(resp.body(), b"v1");
        assert_eq!(cache_control(&resp), Some("public, max-age=86400, immutable"));

        executor.background().drain().await;
        let stored = cached(&store, "static-assets-v2", "/app.css").await.unwrap();
        assert_eq!(stored.body(), b"v2");
    }

    #[tokio::test]
    async fn test_swr_miss_waits_for_network() {
        let (executor, store, fetcher) = setup();
        fetcher.respond("/app.css", Response::ok("v1"));

        let resp = executor.execute(&req("/app.css"), StrategyClass::RevalidateAsset).await;
        assert_eq!(resp.body(), b"v1");
        assert_eq!(cache_control(&resp), Some("public, max-age=86400, immutable"));
        assert!(cached(&store, "static-assets-v2", "/app.css").await.is_some());
    }

    #[tokio::test]
    async fn test_swr_failed_refresh_keeps_entry() {
        let (executor, store, _) = setup();
        seed(&store, "static-assets-v2", "/app.css", Response::ok("v1")).await;

        let resp = executor.execute(&req("/app.css"), StrategyClass::RevalidateAsset).await;
        assert_eq!(resp.body(), b"v1");

        executor.background().drain().await;
        let stored = cached(&store, "static-assets-v2", "/app.css").await.unwrap();
        assert_eq!(stored.body(), b"v1");
    }

    #[tokio::test]
    async fn test_swr_offline_miss() {
        let (executor, _, _) = setup();
        let resp = executor.execute(&req("/app.css"), StrategyClass::RevalidateAsset).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_cached_strategies_have_partitions() {
        let classes = [
            StrategyClass::NetworkOnly,
            StrategyClass::NavigationNetworkFirst,
            StrategyClass::FontCacheFirst,
            StrategyClass::HashedAssetCacheFirst,
            StrategyClass::RevalidateAsset,
            StrategyClass::DefaultNetworkFirst,
        ];
        for class in classes {
            let needs_partition = class.algorithm() != Algorithm::NetworkOnly;
            assert_eq!(class.partition().is_some(), needs_partition, "{}", class);
        }
    }

    #[test]
    fn test_network_first_without_runtime_still_responds() {
        let (executor, store, fetcher) = setup();
        fetcher.respond("/chat", Response::ok("fresh"));

        let resp = futures::executor::block_on(
            executor.execute(&req("/chat"), StrategyClass::DefaultNetworkFirst),
        );
        assert_eq!(resp.body(), b"fresh");
        assert_eq!(executor.background().in_flight(), 0);
        assert_eq!(store.entry_count("static-assets-v2"), None);
    }

    #[tokio::test]
    async fn test_partition_names_follow_version() {
        let store = InMemoryCacheStore::new();
        let fetcher = Arc::new(ScriptedFetcher::default());
        fetcher.respond("/f.woff2", Response::ok("font"));
        let config = WorkerConfig::default().with_cache_version("v9");
        let executor = StrategyExecutor::new(Arc::new(store.clone()), fetcher, Arc::new(config));

        executor.execute(&req("/f.woff2"), StrategyClass::FontCacheFirst).await;
        assert_eq!(store.entry_count("fonts-v9"), Some(1));
        assert_eq!(executor.registry().version(), "v9");
    }
}
