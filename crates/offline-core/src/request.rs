//! Intercepted request descriptors.

use std::sync::atomic::{AtomicU32, Ordering};

use http::Method;
use serde::{Deserialize, Serialize};
use url::Url;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

static REQUEST_SEQ: AtomicU32 = AtomicU32::new(0);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = REQUEST_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("{:x}-{:x}", nanos, seq))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the request was initiated by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    /// A top-level document navigation.
    Navigate,
    /// Any other request (subresource, fetch, XHR).
    #[default]
    Other,
}

/// Immutable description of an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    url: Url,
    method: Method,
    mode: RequestMode,
}

impl RequestDescriptor {
    /// Create a new request descriptor.
    pub fn new(method: Method, url: Url, mode: RequestMode) -> Self {
        Self { url, method, mode }
    }

    /// Create a plain `GET` subresource request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url, RequestMode::Other)
    }

    /// Create a `GET` navigation request.
    pub fn navigate(url: Url) -> Self {
        Self::new(Method::GET, url, RequestMode::Navigate)
    }

    /// Parse a URL string into a plain `GET` request.
    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::get(Url::parse(url)?))
    }

    /// Set the request method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// The request URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request mode.
    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Whether this is a top-level navigation.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Whether the scheme is `http` or `https`.
    pub fn is_http(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }

    /// The URL path component.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Build a sibling `GET` request for another path on the same origin.
    pub fn same_origin(&self, path: &str) -> Result<Self, url::ParseError> {
        Ok(Self::get(self.url.join(path)?))
    }
}

impl std::fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
