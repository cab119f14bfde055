//! Install, activate and message handling.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::try_join_all;
use offline_cache::{CacheHandle, CacheKey, CacheStore, PartitionKind, PartitionRegistry};
use offline_core::{ControlMessage, RequestDescriptor, Url, WorkerConfig, WorkerState};
use offline_fetch::Fetcher;
use serde_json::Value;

use crate::error::{LifecycleError, LifecycleResult};
use crate::host::HostControl;

/// Entries written by a successful install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Entries written to the app-shell partition.
    pub app_shell: usize,
    /// Entries written to the fonts partition.
    pub fonts: usize,
}

impl InstallReport {
    /// Total entries written.
    pub fn total(&self) -> usize {
        self.app_shell + self.fonts
    }
}

/// What a client message resulted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Sender origin does not match the host; dropped.
    ForeignOrigin,
    /// Payload is not an object.
    Malformed,
    /// Object without a known `type`.
    Unrecognized,
    /// Skip-waiting was forwarded to the host.
    SkipWaiting,
    /// A known theme was requested.
    ThemePrecacheRequested(String),
    /// Theme missing or not in the allow-list; nothing done.
    ThemeRejected(Option<String>),
}

/// Drives install and activation of one worker version.
pub struct LifecycleManager<S, F, H> {
    store: Arc<S>,
    fetcher: Arc<F>,
    host: Arc<H>,
    config: Arc<WorkerConfig>,
    registry: PartitionRegistry,
    state: Arc<Mutex<WorkerState>>,
}

impl<S: CacheStore, F: Fetcher, H: HostControl> LifecycleManager<S, F, H> {
    /// Create a manager in the [`WorkerState::Parsed`] state.
    pub fn new(store: Arc<S>, fetcher: Arc<F>, host: Arc<H>, config: Arc<WorkerConfig>) -> Self {
        let registry = PartitionRegistry::new(config.cache_version.clone());
        Self {
            store,
            fetcher,
            host,
            config,
            registry,
            state: Arc::new(Mutex::new(WorkerState::Parsed)),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: WorkerState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
        tracing::debug!(%state, "lifecycle state changed");
    }

    /// The partition registry for this version.
    pub fn registry(&self) -> &PartitionRegistry {
        &self.registry
    }

    /// Precache the app shell and fonts.
    ///
    /// Both partitions are populated concurrently. Any fetch failure or
    /// non-2xx response fails the whole install and leaves the worker
    /// [`Redundant`](WorkerState::Redundant).
    pub async fn install(&self) -> LifecycleResult<InstallReport> {
        self.set_state(WorkerState::Installing);

        match self.precache_all().await {
            Ok(report) => {
                tracing::info!(
                    version = %self.registry.version(),
                    app_shell = report.app_shell,
                    fonts = report.fonts,
                    "install complete"
                );
                self.set_state(WorkerState::Installed);
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(error = %e, "install failed");
                self.set_state(WorkerState::Redundant);
                Err(e)
            }
        }
    }

    async fn precache_all(&self) -> LifecycleResult<InstallReport> {
        let origin = self.config.origin_url()?;
        let (app_shell, fonts) = futures::try_join!(
            self.precache(PartitionKind::AppShell, &origin, &self.config.app_shell_assets),
            self.precache(PartitionKind::Fonts, &origin, &self.config.font_assets)
        )?;
        Ok(InstallReport { app_shell, fonts })
    }

    /// Fetch every path, then write them all. Nothing is written unless
    /// every fetch succeeded.
    async fn precache(
        &self,
        kind: PartitionKind,
        origin: &Url,
        paths: &[String],
    ) -> LifecycleResult<usize> {
        let name = self.registry.physical_name(kind);
        let cache = self.store.open(&name).await?;

        let requests = paths
            .iter()
            .map(|path| {
                origin
                    .join(path)
                    .map(RequestDescriptor::get)
                    .map_err(|source| LifecycleError::InvalidAsset {
                        path: path.clone(),
                        source,
                    })
            })
            .collect::<LifecycleResult<Vec<_>>>()?;

        let fetched = try_join_all(requests.iter().map(|request| async move {
            let response = self.fetcher.fetch(request).await.map_err(|e| {
                LifecycleError::Precache {
                    url: request.url().to_string(),
                    reason: e.to_string(),
                }
            })?;
            if !response.is_success() {
                return Err(LifecycleError::Precache {
                    url: request.url().to_string(),
                    reason: format!("status {}", response.status()),
                });
            }
            Ok((CacheKey::for_request(request), response))
        }))
        .await?;

        let count = fetched.len();
        for (key, response) in fetched {
            cache.put(&key, response).await?;
        }
        tracing::debug!(partition = %name, entries = count, "precached");
        Ok(count)
    }

    /// Delete every partition the current version does not expect, then
    /// claim open clients. Returns the deleted names.
    pub async fn activate(&self) -> LifecycleResult<Vec<String>> {
        let previous = self.state();
        self.set_state(WorkerState::Activating);

        match self.cleanup_and_claim().await {
            Ok(deleted) => {
                self.set_state(WorkerState::Activated);
                Ok(deleted)
            }
            Err(e) => {
                tracing::warn!(error = %e, "activation failed");
                self.set_state(previous);
                Err(e)
            }
        }
    }

    async fn cleanup_and_claim(&self) -> LifecycleResult<Vec<String>> {
        let existing = self.store.keys().await?;
        let stale = self.registry.reconcile(existing);

        let mut deleted = Vec::with_capacity(stale.len());
        for name in stale {
            self.store.delete(&name).await?;
            tracing::info!(partition = %name, "deleted stale partition");
            deleted.push(name);
        }

        self.host.claim_clients().await?;
        Ok(deleted)
    }

    /// Handle a message posted by a client.
    ///
    /// Never fails: anything unexpected is dropped and reported in the
    /// outcome.
    pub async fn on_message(&self, data: &Value, origin_matches_host: bool) -> MessageOutcome {
        if !origin_matches_host {
            tracing::debug!("ignoring message from foreign origin");
            return MessageOutcome::ForeignOrigin;
        }
        if !data.is_object() {
            return MessageOutcome::Malformed;
        }

        match ControlMessage::parse(data) {
            None => MessageOutcome::Unrecognized,
            Some(ControlMessage::SkipWaiting) => {
                if let Err(e) = self.host.skip_waiting().await {
                    tracing::warn!(error = %e, "skip waiting failed");
                }
                MessageOutcome::SkipWaiting
            }
            Some(ControlMessage::PrecacheTheme { theme: Some(theme) })
                if self.config.is_known_theme(&theme) =>
            {
                // Theme assets are not published yet; the request is only recorded.
                tracing::info!(%theme, "theme precache requested");
                MessageOutcome::ThemePrecacheRequested(theme)
            }
            Some(ControlMessage::PrecacheTheme { theme }) => {
                tracing::debug!(?theme, "unknown theme");
                MessageOutcome::ThemeRejected(theme)
            }
        }
    }
}
