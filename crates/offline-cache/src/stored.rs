//! Byte encoding of cached responses for persistent backends.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use http::header::{HeaderName, HeaderValue};
use offline_core::{HeaderMap, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::store::{CacheError, CacheResult};

/// A response as written to a byte-oriented backend.
///
/// Header values and the body are base64-encoded so that bytes outside
/// UTF-8 (obs-text in a header, binary bodies) survive unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    /// HTTP status code.
    pub status: u16,
    /// Header names and base64-encoded values, in order.
    pub headers: Vec<(String, String)>,
    /// Base64-encoded body.
    pub body: String,
}

fn corrupt(e: impl std::fmt::Display) -> CacheError {
    CacheError::Serialization(e.to_string())
}

impl StoredResponse {
    /// Encode a response.
    pub fn from_response(response: &Response) -> Self {
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), BASE64.encode(value.as_bytes())))
            .collect();
        Self {
            status: response.status().as_u16(),
            headers,
            body: BASE64.encode(response.body()),
        }
    }

    /// Decode back into a response.
    pub fn into_response(self) -> CacheResult<Response> {
        let status = StatusCode::from_u16(self.status).map_err(corrupt)?;
        let mut headers = HeaderMap::new();
        for (name, value) in self.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(corrupt)?;
            let bytes = BASE64.decode(value).map_err(corrupt)?;
            let value = HeaderValue::from_bytes(&bytes).map_err(corrupt)?;
            headers.append(name, value);
        }
        let body = BASE64.decode(self.body).map_err(corrupt)?;
        Ok(Response::new(status, headers, body))
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> CacheResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> CacheResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE};

    fn roundtrip(response: &Response) -> Response {
        let bytes = StoredResponse::from_response(response).to_bytes().unwrap();
        StoredResponse::from_bytes(&bytes).unwrap().into_response().unwrap()
    }

    #[test]
    fn test_stored_response_preserves_response() {
        let response = Response::with_status(StatusCode::CREATED, vec![0u8, 159, 146, 150])
            .header(CONTENT_TYPE, HeaderValue::from_static("application/wasm"));

        let stored = StoredResponse::from_response(&response);
        assert_eq!(stored.status, 201);
        assert_eq!(roundtrip(&response), response);
    }

    #[test]
    fn test_stored_response_preserves_opaque_header_bytes() {
        let latin1 = HeaderValue::from_bytes(b"attachment; filename=caf\xe9.txt").unwrap();
        let response = Response::ok("menu").header(CONTENT_DISPOSITION, latin1.clone());

        let restored = roundtrip(&response);
        assert_eq!(restored.headers().get(CONTENT_DISPOSITION), Some(&latin1));
        assert_eq!(restored, response);
    }

    #[test]
    fn test_stored_response_keeps_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        let response = Response::new(StatusCode::OK, headers, "x");

        let restored = StoredResponse::from_response(&response).into_response().unwrap();
        assert_eq!(restored.headers().get_all(SET_COOKIE).iter().count(), 2);
    }

    #[test]
    fn test_stored_response_rejects_corrupt_body() {
        let stored = StoredResponse {
            status: 200,
            headers: Vec::new(),
            body: "***not base64***".to_string(),
        };
        assert!(matches!(stored.into_response(), Err(CacheError::Serialization(_))));
    }

    #[test]
    fn test_stored_response_rejects_corrupt_header() {
        let stored = StoredResponse {
            status: 200,
            headers: vec![("etag".to_string(), "%%%".to_string())],
            body: String::new(),
        };
        assert!(matches!(stored.into_response(), Err(CacheError::Serialization(_))));
    }

    #[test]
    fn test_stored_response_rejects_bad_status() {
        let stored = StoredResponse {
            status: 42,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(stored.into_response().is_err());
    }
}
