//! Request classification.
//!
//! Maps a request to the caching strategy that serves it. Rules are evaluated
//! top to bottom and the first match wins; they overlap (an API path can also
//! end in `.json`), so the order is part of the contract.

use offline_cache::{FreshnessWindow, PartitionKind};
use offline_core::{Method, RequestDescriptor, WorkerConfig};
use regex::Regex;

/// Errors building a classifier from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Caching algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Network only; never touches the cache.
    NetworkOnly,
    /// Network first, cache on failure.
    NetworkFirst,
    /// Cache first, network on miss.
    CacheFirst,
    /// Serve cache immediately, refresh in the background.
    StaleWhileRevalidate,
}

/// The strategy selected for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyClass {
    /// API traffic.
    NetworkOnly,
    /// Document navigations.
    NavigationNetworkFirst,
    /// Web fonts.
    FontCacheFirst,
    /// Static assets with a content hash in the filename.
    HashedAssetCacheFirst,
    /// Static assets without a content hash.
    RevalidateAsset,
    /// Everything else.
    DefaultNetworkFirst,
}

impl StrategyClass {
    /// The algorithm implementing this class.
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::NetworkOnly => Algorithm::NetworkOnly,
            Self::NavigationNetworkFirst | Self::DefaultNetworkFirst => Algorithm::NetworkFirst,
            Self::FontCacheFirst | Self::HashedAssetCacheFirst => Algorithm::CacheFirst,
            Self::RevalidateAsset => Algorithm::StaleWhileRevalidate,
        }
    }

    /// The partition this class reads and writes, if any.
    pub fn partition(&self) -> Option<PartitionKind> {
        match self {
            Self::NetworkOnly => None,
            Self::NavigationNetworkFirst => Some(PartitionKind::AppShell),
            Self::FontCacheFirst => Some(PartitionKind::Fonts),
            Self::HashedAssetCacheFirst | Self::RevalidateAsset | Self::DefaultNetworkFirst => {
                Some(PartitionKind::StaticAssets)
            }
        }
    }

    /// The freshness window stamped on responses served from cache.
    pub fn freshness(&self) -> Option<FreshnessWindow> {
        match self.algorithm() {
            Algorithm::NetworkOnly => None,
            Algorithm::NetworkFirst => Some(FreshnessWindow::Short),
            Algorithm::CacheFirst => Some(FreshnessWindow::Long),
            Algorithm::StaleWhileRevalidate => Some(FreshnessWindow::Medium),
        }
    }

    /// Stable name for logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NetworkOnly => "network-only",
            Self::NavigationNetworkFirst => "navigation-network-first",
            Self::FontCacheFirst => "font-cache-first",
            Self::HashedAssetCacheFirst => "hashed-asset-cache-first",
            Self::RevalidateAsset => "revalidate-asset",
            Self::DefaultNetworkFirst => "default-network-first",
        }
    }
}

impl std::fmt::Display for StrategyClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classifies requests according to a [`WorkerConfig`].
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    api_prefix: String,
    font_extension: String,
    static_asset: Regex,
    content_hash: Regex,
}

impl RequestClassifier {
    /// Build a classifier from configuration.
    pub fn new(config: &WorkerConfig) -> Result<Self, ClassifierError> {
        let extensions: Vec<String> = config
            .static_extensions
            .iter()
            .map(|ext| regex::escape(ext))
            .collect();
        let static_asset = Regex::new(&format!(r"(?i)\.({})$", extensions.join("|")))?;
        // Heuristic: a separator followed by at least 8 hex digits right before an extension.
        let content_hash = Regex::new(r"(?i)[-_][a-f0-9]{8,}\.")?;

        Ok(Self {
            api_prefix: config.api_prefix.clone(),
            font_extension: config.font_extension.clone(),
            static_asset,
            content_hash,
        })
    }

    /// Whether the request is intercepted at all.
    ///
    /// Only `GET` over `http`/`https` is; everything else falls through to
    /// the platform's default handling.
    pub fn intercepts(&self, request: &RequestDescriptor) -> bool {
        request.is_http() && *request.method() == Method::GET
    }

    /// Select the strategy for `request`, or `None` when it is not intercepted.
    pub fn classify(&self, request: &RequestDescriptor) -> Option<StrategyClass> {
        if !self.intercepts(request) {
            return None;
        }

        let path = request.path();

        let class = if path.starts_with(&self.api_prefix) {
            StrategyClass::NetworkOnly
        } else if request.is_navigation() {
            StrategyClass::NavigationNetworkFirst
        } else if path.ends_with(&self.font_extension) {
            StrategyClass::FontCacheFirst
        } else if self.is_static_asset(path) {
            if self.has_content_hash(path) {
                StrategyClass::HashedAssetCacheFirst
            } else {
                StrategyClass::RevalidateAsset
            }
        } else {
            StrategyClass::DefaultNetworkFirst
        };

        Some(class)
    }

    /// Whether `path` ends with a static-asset extension.
    pub fn is_static_asset(&self, path: &str) -> bool {
        self.static_asset.is_match(path)
    }

    /// Whether the filename in `path` carries a content-hash token.
    pub fn has_content_hash(&self, path: &str) -> bool {
        let filename = path.rsplit('/').next().unwrap_or(path);
        self.content_hash.is_match(filename)
    }
}
