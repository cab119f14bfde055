//! Request classification and caching strategies.
//!
//! This crate decides how each intercepted request is served:
//! - `RequestClassifier` - Maps a request to a `StrategyClass`
//! - `StrategyExecutor` - Network-only, network-first, cache-first and stale-while-revalidate
//! - `BackgroundTasks` - Detached cache writes and revalidations
//! - `offline_json` / `offline_text` - Synthetic 503 responses

mod background;
mod classifier;
mod executor;
mod fallback;

pub use background::*;
pub use classifier::*;
pub use executor::*;
pub use fallback::*;
