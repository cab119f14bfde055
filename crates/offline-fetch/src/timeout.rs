//! Timeout wrapper for fetchers.

use std::time::Duration;

use async_trait::async_trait;
use offline_core::{RequestDescriptor, Response};

use crate::client::{FetchError, Fetcher};

/// Wraps a fetcher so that a fetch taking longer than `timeout` fails with
/// [`FetchError::Timeout`], which the strategies treat like any other
/// network failure.
#[derive(Debug, Clone)]
pub struct TimeoutFetcher<F> {
    inner: F,
    timeout: Duration,
}

impl<F: Fetcher> TimeoutFetcher<F> {
    /// Wrap `inner` with a total timeout.
    pub fn new(inner: F, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The wrapped fetcher.
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for TimeoutFetcher<F> {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<Response, FetchError> {
        match tokio::time::timeout(self.timeout, self.inner.fetch(request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(url = %request.url(), timeout = ?self.timeout, "fetch timed out");
                Err(FetchError::Timeout(self.timeout))
            }
        }
    }
}
