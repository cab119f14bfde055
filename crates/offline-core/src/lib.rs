//! Core types for the offline caching worker.
//!
//! This crate provides:
//! - `RequestDescriptor` - Immutable description of an intercepted request
//! - `Response` - Fully materialized response shared by fetcher and cache
//! - `WorkerConfig` - Versioning, routing rules and precache manifests
//! - `WorkerState` / `ControlMessage` - Lifecycle tracking and client commands

mod config;
mod lifecycle;
mod request;
mod response;

pub use config::*;
pub use lifecycle::*;
pub use request::*;
pub use response::*;

pub use http::{HeaderMap, Method, StatusCode};
pub use url::Url;
