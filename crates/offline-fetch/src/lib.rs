//! Network access for the offline caching worker.
//!
//! This crate provides:
//! - `Fetcher` - Transport interface consumed by the caching strategies
//! - `FetchError` - Transport failures (never HTTP error statuses)
//! - `TimeoutFetcher` - Turns a slow fetch into a transport failure

mod client;
mod timeout;

pub use client::*;
pub use timeout::*;
