//! Control calls the worker makes into its host environment.

use async_trait::async_trait;

use crate::error::LifecycleResult;

/// Host-side controls available to the worker.
#[async_trait]
pub trait HostControl: Send + Sync + 'static {
    /// Activate this worker without waiting for older instances to go idle.
    async fn skip_waiting(&self) -> LifecycleResult<()>;

    /// Take control of all open clients immediately.
    async fn claim_clients(&self) -> LifecycleResult<()>;
}

/// Host that accepts every control call and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

#[async_trait]
impl HostControl for NoopHost {
    async fn skip_waiting(&self) -> LifecycleResult<()> {
        Ok(())
    }

    async fn claim_clients(&self) -> LifecycleResult<()> {
        Ok(())
    }
}
