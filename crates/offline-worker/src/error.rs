//! Error types for the offline worker.

use offline_cache::CacheError;
use offline_core::ConfigError;
use offline_strategy::ClassifierError;
use thiserror::Error;

/// Errors from the install and activate phases.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A manifest asset could not be fetched, or came back non-2xx.
    #[error("Precache failed for {url}: {reason}")]
    Precache { url: String, reason: String },

    /// A manifest path does not resolve against the origin.
    #[error("Invalid asset path '{path}': {source}")]
    InvalidAsset {
        path: String,
        #[source]
        source: url::ParseError,
    },

    /// Cache store error.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The host rejected a control call.
    #[error("Host error: {0}")]
    Host(String),
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Errors constructing a worker.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Classifier error.
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
}
