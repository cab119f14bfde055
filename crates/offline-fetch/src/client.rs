//! Fetcher interface.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use offline_core::{RequestDescriptor, Response};

/// A transport-level fetch failure.
///
/// An HTTP error status is not a `FetchError`: a 404 or 500 is a successful
/// fetch of an unsuccessful response and arrives as `Ok(Response)`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Performs the actual network call for a request.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Fetch `request` from the network.
    async fn fetch(&self, request: &RequestDescriptor) -> Result<Response, FetchError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<Response, FetchError> {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<Response, FetchError> {
        (**self).fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Offline;

    #[async_trait]
    impl Fetcher for Offline {
        async fn fetch(&self, request: &RequestDescriptor) -> Result<Response, FetchError> {
            Err(FetchError::Network(format!("no route to {}", request.url())))
        }
    }

    #[tokio::test]
    async fn test_arc_and_box_delegate() {
        let req = RequestDescriptor::parse("https://example.com/").unwrap();

        let arc: Arc<dyn Fetcher> = Arc::new(Offline);
        assert!(matches!(arc.fetch(&req).await, Err(FetchError::Network(_))));

        let boxed: Box<dyn Fetcher> = Box::new(Offline);
        assert!(matches!(boxed.fetch(&req).await, Err(FetchError::Network(_))));
    }

    #[test]
    fn test_error_display() {
        let err = FetchError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "timed out after 250ms");
    }
}
