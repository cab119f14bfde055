//! Cache key composition.

use offline_core::RequestDescriptor;
use serde::{Deserialize, Serialize};

/// A cache key uniquely identifying a cached response within a partition.
///
/// Composed of the request method and URL; the URL fragment never reaches
/// the network and is not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Create a cache key from a raw string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Build the key for a request.
    pub fn for_request(request: &RequestDescriptor) -> Self {
        let mut url = request.url().clone();
        url.set_fragment(None);
        Self(format!("{} {}", request.method(), url))
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&RequestDescriptor> for CacheKey {
    fn from(request: &RequestDescriptor) -> Self {
        Self::for_request(request)
    }
}
