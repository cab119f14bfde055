//! Offline caching worker.
//!
//! Intercepts outgoing requests from a client application and serves each
//! one from a versioned local cache, the network, or both.
//!
//! # Architecture
//!
//! `OfflineWorker` wires together:
//! - `RequestClassifier` - Picks a strategy per request
//! - `StrategyExecutor` - Runs the strategy against the cache and the network
//! - `LifecycleManager` - Precaches on install, prunes old versions on activate
//! - `HostControl` - Skip-waiting and client claiming in the host
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use offline_worker::prelude::*;
//!
//! let worker = OfflineWorker::new(
//!     WorkerConfig::default(),
//!     Arc::new(InMemoryCacheStore::new()),
//!     Arc::new(my_fetcher),
//!     Arc::new(NoopHost),
//! )?;
//!
//! worker.handle_event(LifecycleEvent::Install).await?;
//! worker.handle_event(LifecycleEvent::Activate).await?;
//!
//! let request = RequestDescriptor::parse("https://example.com/app.css")?;
//! let response = worker.handle_fetch(&request).await;
//! ```

pub mod prelude;
mod error;
mod host;
mod lifecycle;
mod worker;

pub use error::*;
pub use host::*;
pub use lifecycle::*;
pub use worker::*;
