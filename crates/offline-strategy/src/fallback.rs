//! Synthetic responses returned when neither network nor cache can answer.

use http::header::{HeaderValue, CONTENT_TYPE};
use offline_core::{Response, StatusCode};

/// Body of the structured offline error.
pub const OFFLINE_JSON_BODY: &str = r#"{"error":"offline"}"#;

/// Body of the plain-text offline error.
pub const OFFLINE_TEXT_BODY: &str = "Offline";

/// Machine-readable offline error for API traffic.
pub fn offline_json() -> Response {
    Response::with_status(StatusCode::SERVICE_UNAVAILABLE, OFFLINE_JSON_BODY)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
}

/// Plain-text offline error for everything else.
pub fn offline_text() -> Response {
    Response::with_status(StatusCode::SERVICE_UNAVAILABLE, OFFLINE_TEXT_BODY)
        .header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))
}

/// Whether `response` is one of the synthetic offline errors.
pub fn is_offline_fallback(response: &Response) -> bool {
    response.status() == StatusCode::SERVICE_UNAVAILABLE
        && (response.body() == OFFLINE_JSON_BODY.as_bytes()
            || response.body() == OFFLINE_TEXT_BODY.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_json() {
        let resp = offline_json();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.content_type(), Some("application/json"));

        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["error"], "offline");
    }

    #[test]
    fn test_offline_text() {
        let resp = offline_text();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.content_type(), Some("text/plain; charset=utf-8"));
        assert_eq!(resp.text(), "Offline");
    }

    #[test]
    fn test_is_offline_fallback() {
        assert!(is_offline_fallback(&offline_json()));
        assert!(is_offline_fallback(&offline_text()));
        assert!(!is_offline_fallback(&Response::with_status(
            StatusCode::SERVICE_UNAVAILABLE,
            "upstream down"
        )));
        assert!(!is_offline_fallback(&Response::ok("Offline")));
    }
}
