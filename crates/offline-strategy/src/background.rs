//! Detached background work (cache writes and revalidations).

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Tracks detached tasks spawned while serving requests.
///
/// Tasks are fire-and-forget from the request's point of view. The host can
/// still wait for them with [`drain`](Self::drain) before shutting down.
///
/// Tasks run on the ambient tokio runtime. Outside one they are dropped with
/// a warning instead of panicking the caller.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BackgroundTasks {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` on the current tokio runtime. Returns `false` when there
    /// is no runtime and the task was dropped.
    pub fn spawn<T>(&self, task: T) -> bool
    where
        T: Future<Output = ()> + Send + 'static,
    {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!(error = %e, "no tokio runtime, background task dropped");
                return false;
            }
        };
        let handle = runtime.spawn(task);
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
        true
    }

    /// Number of tasks not yet finished.
    pub fn in_flight(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every tracked task, including ones spawned while draining.
    pub async fn drain(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = {
                let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
                std::mem::take(&mut *handles)
            };
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "background task failed");
                }
            }
        }
    }
}
