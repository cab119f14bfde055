//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use offline_worker::prelude::*;
//! ```

pub use std::sync::Arc;

pub use offline_cache::{CacheStore, InMemoryCacheStore, PartitionKind, PartitionRegistry};
pub use offline_core::{
    LifecycleEvent, RequestDescriptor, RequestMode, Response, WorkerConfig, WorkerState,
};
pub use offline_fetch::{FetchError, Fetcher, TimeoutFetcher};
pub use offline_strategy::StrategyClass;

pub use crate::{
    EventOutcome, HostControl, LifecycleError, MessageOutcome, NoopHost, OfflineWorker,
    WorkerError,
};
