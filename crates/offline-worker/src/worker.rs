//! The offline worker: lifecycle events in, responses out.

use std::sync::Arc;

use offline_cache::{CacheStore, PartitionRegistry};
use offline_core::{
    origin_matches_host, LifecycleEvent, RequestDescriptor, RequestId, Response, Url, WorkerConfig,
    WorkerState,
};
use offline_fetch::Fetcher;
use offline_strategy::{is_offline_fallback, RequestClassifier, StrategyClass, StrategyExecutor};
use serde_json::Value;
use tracing::Instrument;

use crate::error::{LifecycleResult, WorkerError};
use crate::host::HostControl;
use crate::lifecycle::{InstallReport, LifecycleManager, MessageOutcome};

/// Result of a lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Install finished.
    Installed(InstallReport),
    /// Activation finished; carries the deleted partition names.
    Activated(Vec<String>),
    /// A client message was handled.
    Message(MessageOutcome),
}

/// An offline caching worker.
///
/// Owns the classifier, the strategy executor and the lifecycle manager for
/// one configuration. Each [`handle_fetch`](Self::handle_fetch) call is
/// independent and may run concurrently with others.
///
/// Expects to run inside a tokio runtime, which carries the background cache
/// writes. Outside one, fetches are still answered but background writes are
/// dropped (see [`StrategyExecutor`]).
///
/// # Example
///
/// ```rust,ignore
/// let worker = OfflineWorker::new(config, Arc::new(store), Arc::new(fetcher), Arc::new(NoopHost))?;
/// worker.install().await?;
/// worker.activate().await?;
///
/// if let Some(response) = worker.handle_fetch(&request).await {
///     // respond with it
/// }
/// ```
pub struct OfflineWorker<S, F, H> {
    config: Arc<WorkerConfig>,
    origin: Url,
    classifier: RequestClassifier,
    executor: StrategyExecutor<S, F>,
    lifecycle: LifecycleManager<S, F, H>,
}

impl<S: CacheStore, F: Fetcher, H: HostControl> OfflineWorker<S, F, H> {
    /// Build a worker. The configuration is validated first.
    pub fn new(
        config: WorkerConfig,
        store: Arc<S>,
        fetcher: Arc<F>,
        host: Arc<H>,
    ) -> Result<Self, WorkerError> {
        config.validate()?;
        let origin = config.origin_url()?;
        let classifier = RequestClassifier::new(&config)?;
        let config = Arc::new(config);

        let executor = StrategyExecutor::new(store.clone(), fetcher.clone(), config.clone());
        let lifecycle = LifecycleManager::new(store, fetcher, host, config.clone());

        Ok(Self {
            config,
            origin,
            classifier,
            executor,
            lifecycle,
        })
    }

    /// The configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// The origin the worker is hosted on.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// The request classifier.
    pub fn classifier(&self) -> &RequestClassifier {
        &self.classifier
    }

    /// The partition registry for the configured version.
    pub fn registry(&self) -> &PartitionRegistry {
        self.lifecycle.registry()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.lifecycle.state()
    }

    /// Strategy chosen for `request`, or `None` when it is not intercepted.
    pub fn classify(&self, request: &RequestDescriptor) -> Option<StrategyClass> {
        self.classifier.classify(request)
    }

    /// Serve an outgoing request.
    ///
    /// Returns `None` when the request is not intercepted (non-`GET` or
    /// non-http(s)); the host then lets it through untouched. Otherwise
    /// exactly one response is produced, real or synthetic.
    pub async fn handle_fetch(&self, request: &RequestDescriptor) -> Option<Response> {
        let class = self.classifier.classify(request)?;
        let request_id = RequestId::generate();
        let span = tracing::info_span!(
            "fetch",
            request_id = %request_id,
            method = %request.method(),
            url = %request.url(),
            strategy = %class,
        );

        let response = async {
            let response = self.executor.execute(request, class).await;
            if is_offline_fallback(&response) {
                tracing::info!(status = %response.status(), "served offline fallback");
            } else {
                tracing::debug!(status = %response.status(), "served");
            }
            response
        }
        .instrument(span)
        .await;

        Some(response)
    }

    /// Wait for outstanding background cache writes and revalidations.
    pub async fn drain_background(&self) {
        self.executor.background().drain().await;
    }

    /// Number of background tasks still running.
    pub fn background_in_flight(&self) -> usize {
        self.executor.background().in_flight()
    }

    /// Precache the app shell and fonts.
    pub async fn install(&self) -> LifecycleResult<InstallReport> {
        self.lifecycle.install().await
    }

    /// Remove stale partitions and claim clients.
    pub async fn activate(&self) -> LifecycleResult<Vec<String>> {
        self.lifecycle.activate().await
    }

    /// Handle a client message with an already-checked origin.
    pub async fn on_message(&self, data: &Value, origin_matches_host: bool) -> MessageOutcome {
        self.lifecycle.on_message(data, origin_matches_host).await
    }

    /// Handle a client message, checking `origin` against the host origin.
    pub async fn on_message_from(&self, data: &Value, origin: Option<&str>) -> MessageOutcome {
        let same_origin = origin_matches_host(&self.origin, origin);
        self.lifecycle.on_message(data, same_origin).await
    }

    /// Dispatch a host lifecycle event.
    pub async fn handle_event(&self, event: LifecycleEvent) -> LifecycleResult<EventOutcome> {
        match event {
            LifecycleEvent::Install => self.install().await.map(EventOutcome::Installed),
            LifecycleEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            LifecycleEvent::Message {
                data,
                origin_matches_host,
            } => Ok(EventOutcome::Message(
                self.on_message(&data, origin_matches_host).await,
            )),
        }
    }
}
