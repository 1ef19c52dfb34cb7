//! Response handling and transformation.
//!
//! # Responsibilities
//! - Hold the fully buffered upstream response
//! - Rewrite iOS-flavoured text back for Android clients
//! - Re-emit the response, keeping the upstream Content-Length unless the
//!   body was rewritten
//!
//! # Design Decisions
//! - The whole body is buffered because substitutions span the payload
//! - Only identity-encoded JSON or text bodies are rewritten
//! - Anything else is returned byte-for-byte

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::headers::{header_str, strip_hop_by_hop};
use crate::observability::metrics;
use crate::rewrite::{RewriteError, RuleSet};

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let mut headers = self.headers;
        // Content-Length is left as the upstream sent it: HEAD replies carry
        // the length of a body that is never sent, and 204/304 carry none.
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

/// Rewrites responses headed back to Android clients.
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    rules: RuleSet,
}

impl ResponseNormalizer {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn normalize(&self, mut resp: UpstreamResponse, was_android_client: bool) -> UpstreamResponse {
        if !was_android_client || resp.body.is_empty() || !is_rewritable(&resp.headers) {
            return resp;
        }

        match self.rules.rewrite_bytes(&resp.body) {
            Ok(Some(text)) => {
                metrics::record_rewrite("response");
                resp.body = Bytes::from(text);
                resp.headers
                    .insert(header::CONTENT_LENGTH, HeaderValue::from(resp.body.len()));
            }
            Ok(None) => {}
            Err(RewriteError::NotUtf8(e)) => {
                tracing::debug!(error = %e, "Response body is not UTF-8, returning as-is");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Response rewrite failed, returning as-is");
            }
        }
        resp
    }
}

/// JSON or text, and not compressed.
fn is_rewritable(headers: &HeaderMap) -> bool {
    let content_type = header_str(headers, header::CONTENT_TYPE).to_ascii_lowercase();
    let textual = content_type.contains("application/json") || content_type.contains("text/");

    let encoding = header_str(headers, header::CONTENT_ENCODING);
    let identity = encoding.is_empty() || encoding.eq_ignore_ascii_case("identity");

    textual && identity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::platform::response_rules;

    fn response(content_type: &str, body: &str) -> UpstreamResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        UpstreamResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::from(body.to_string()),
        }
    }

    fn normalizer() -> ResponseNormalizer {
        ResponseNormalizer::new(response_rules().unwrap())
    }

    #[test]
    fn test_android_client_gets_rewritten_body() {
        let resp = response(
            "application/json; charset=utf-8",
            r#"{"cfg":"items_ios.json","os":"iPhone OS 17"}"#,
        );
        let out = normalizer().normalize(resp, true);
        assert_eq!(out.body, Bytes::from(r#"{"cfg":"items_android.json","os":"Android 17"}"#));
        assert_eq!(
            header_str(&out.headers, header::CONTENT_LENGTH),
            out.body.len().to_string()
        );
    }

    #[test]
    fn test_ios_client_body_identical() {
        let body = r#"{"cfg":"items_ios.json","os":"iPhone OS 17"}"#;
        let out = normalizer().normalize(response("application/json", body), false);
        assert_eq!(out.body, Bytes::from(body));
    }

    #[test]
    fn test_no_marker_no_change() {
        let body = r#"{"file":"skin_android.json"}"#;
        let out = normalizer().normalize(response("application/json", body), true);
        assert_eq!(out.body, Bytes::from(body));
    }

    #[test]
    fn test_non_textual_untouched() {
        let body = "iPad iPhone OS";
        let out = normalizer().normalize(response("application/octet-stream", body), true);
        assert_eq!(out.body, Bytes::from(body));

        let out = normalizer().normalize(response("text/plain", body), true);
        assert_eq!(out.body, Bytes::from("Pixel 6 Android"));
    }

    #[test]
    fn test_compressed_untouched() {
        let mut resp = response("application/json", "iPad");
        resp.headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        let out = normalizer().normalize(resp, true);
        assert_eq!(out.body, Bytes::from("iPad"));
    }

    #[test]
    fn test_invalid_utf8_untouched() {
        let mut resp = response("text/plain", "");
        resp.body = Bytes::from_static(&[0xc3, 0x28, b'i', b'P', b'a', b'd']);
        let out = normalizer().normalize(resp.clone(), true);
        assert_eq!(out.body, resp.body);
    }

    #[test]
    fn test_into_response_strips_hop_by_hop() {
        let mut resp = response("text/plain", "hi");
        resp.headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        let out = resp.into_response();
        assert!(!out.headers().contains_key(header::TRANSFER_ENCODING));
        assert_eq!(out.headers()[header::CONTENT_LENGTH], "2");
    }

    #[test]
    fn test_head_reply_keeps_upstream_length() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("10"));
        let resp = UpstreamResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::new(),
        };

        let out = normalizer().normalize(resp, true).into_response();
        assert_eq!(out.headers()[header::CONTENT_LENGTH], "10");
    }

    #[test]
    fn test_no_content_gains_no_length() {
        let resp = UpstreamResponse {
            status: StatusCode::NO_CONTENT,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };
        let out = resp.into_response();
        assert_eq!(out.status(), StatusCode::NO_CONTENT);
        assert!(!out.headers().contains_key(header::CONTENT_LENGTH));
    }
}
