//! Fetcher serving a build output directory.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use offline_core::{RequestDescriptor, Response, StatusCode};
use offline_fetch::{FetchError, Fetcher};

/// Serves request paths from files under a root directory.
///
/// `/` and directories map to their `index.html`. A missing file is a 404
/// response, not a fetch error.
#[derive(Debug)]
pub struct FsFetcher {
    root: PathBuf,
    served_bytes: AtomicU64,
}

impl FsFetcher {
    /// Serve files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            served_bytes: AtomicU64::new(0),
        }
    }

    /// Total body bytes served so far.
    pub fn served_bytes(&self) -> u64 {
        self.served_bytes.load(Ordering::Relaxed)
    }

    /// Map a URL path to a file under the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(FetchError::InvalidRequest(format!("path escapes root: {}", path)));
        }

        let mut file = self.root.join(relative);
        if path.ends_with('/') || file.is_dir() {
            file.push("index.html");
        }
        Ok(file)
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("wasm") => "application/wasm",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl Fetcher for FsFetcher {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<Response, FetchError> {
        let file = self.resolve(request.path())?;

        match tokio::fs::read(&file).await {
            Ok(body) => {
                self.served_bytes
                    .fetch_add(body.len() as u64, Ordering::Relaxed);
                tracing::debug!(file = %file.display(), bytes = body.len(), "served");
                let value = http::HeaderValue::from_static(content_type(&file));
                Ok(Response::ok(body).header(http::header::CONTENT_TYPE, value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(file = %file.display(), "not found");
                Ok(Response::with_status(StatusCode::NOT_FOUND, "Not Found"))
            }
            Err(e) => Err(FetchError::Network(format!("{}: {}", file.display(), e))),
        }
    }
}
