//! Cache partitions and storage for the offline caching worker.
//!
//! This crate provides:
//! - `PartitionRegistry` - Versioned partition naming and stale-partition reconciliation
//! - `CacheStore` / `CacheHandle` - Partition store interface
//! - `InMemoryCacheStore` - Concurrent in-memory store
//! - `DirCacheStore` - Store persisted as one directory per partition
//! - `CacheKey` - Method + URL entry keys
//! - `decorate` - `Cache-Control` injection for served responses
//! - `StoredResponse` - Byte encoding for persistent backends
//!
//! # Example
//!
//! ```ignore
//! use offline_cache::{CacheStore, InMemoryCacheStore, PartitionKind, PartitionRegistry};
//!
//! let registry = PartitionRegistry::new("v2");
//! let store = InMemoryCacheStore::new();
//!
//! let stale = registry.reconcile(store.keys().await?);
//! for name in stale {
//!     store.delete(&name).await?;
//! }
//! let fonts = store.open(&registry.physical_name(PartitionKind::Fonts)).await?;
//! ```

mod dir;
mod headers;
mod key;
mod partition;
mod store;
mod stored;

pub use dir::*;
pub use headers::*;
pub use key::*;
pub use partition::*;
pub use store::*;
pub use stored::*;
