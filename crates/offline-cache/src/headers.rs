//! Freshness headers injected into served responses.

use http::header::{HeaderValue, CACHE_CONTROL};
use offline_core::{FreshnessConfig, Response};

/// Freshness window applied to a served response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessWindow {
    /// Cached copy served because the network failed (about an hour).
    Short,
    /// Stale-while-revalidate copy (about a day).
    Medium,
    /// Content-addressed asset (about a year).
    Long,
}

impl FreshnessWindow {
    /// Resolve the window to `max-age` seconds.
    pub fn max_age_secs(&self, config: &FreshnessConfig) -> u64 {
        match self {
            Self::Short => config.short_secs,
            Self::Medium => config.medium_secs,
            Self::Long => config.long_secs,
        }
    }
}

impl std::fmt::Display for FreshnessWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Short => write!(f, "short"),
            Self::Medium => write!(f, "medium"),
            Self::Long => write!(f, "long"),
        }
    }
}

/// Build the `Cache-Control` value for a given max-age.
pub fn cache_control_value(max_age_secs: u64) -> String {
    format!("public, max-age={}, immutable", max_age_secs)
}

/// Copy `response` with its `Cache-Control` header overridden.
///
/// Status, body and every other header are kept as-is. The input is never
/// modified; callers may keep forwarding it.
pub fn decorate(response: &Response, max_age_secs: u64) -> Response {
    let (status, mut headers, body) = response.clone().into_parts();
    let value = HeaderValue::from_str(&cache_control_value(max_age_secs))
        .unwrap_or_else(|_| HeaderValue::from_static("public, immutable"));
    headers.insert(CACHE_CONTROL, value);
    Response::new(status, headers, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_TYPE, ETAG};
    use offline_core::StatusCode;

    fn sample() -> Response {
        Response::ok("body")
            .header(CONTENT_TYPE, HeaderValue::from_static("text/css"))
            .header(ETAG, HeaderValue::from_static("\"abc\""))
            .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
    }

    #[test]
    fn test_decorate_overrides_cache_control() {
        let decorated = decorate(&sample(), 86_400);
        assert_eq!(
            decorated.header_str("cache-control"),
            Some("public, max-age=86400, immutable")
        );
        assert_eq!(decorated.headers().get_all(CACHE_CONTROL).iter().count(), 1);
    }

    #[test]
    fn test_decorate_keeps_everything_else() {
        let original = Response::with_status(StatusCode::NOT_FOUND, "missing")
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let decorated = decorate(&original, 3_600);

        assert_eq!(decorated.status(), StatusCode::NOT_FOUND);
        assert_eq!(decorated.body(), b"missing");
        assert_eq!(decorated.content_type(), Some("text/plain"));
    }

    #[test]
    fn test_decorate_does_not_mutate_input() {
        let original = sample();
        let _ = decorate(&original, 31_536_000);
        assert_eq!(original.header_str("cache-control"), Some("no-cache"));
        assert_eq!(original, sample());
    }

    #[test]
    fn test_freshness_windows() {
        let config = FreshnessConfig::default();
        assert_eq!(FreshnessWindow::Short.max_age_secs(&config), 3_600);
        assert_eq!(FreshnessWindow::Medium.max_age_secs(&config), 86_400);
        assert_eq!(FreshnessWindow::Long.max_age_secs(&config), 31_536_000);
    }
}
