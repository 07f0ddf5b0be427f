//! Request ID middleware for request tracing and correlation.
//!
//! An upstream proxy's `x-request-id` is kept if it is a sane token;
//! otherwise a UUID v4 is generated. The id is recorded in the tracing span,
//! tagged on the Sentry scope, and echoed in the response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest inbound request id that is trusted.
const MAX_REQUEST_ID_LENGTH: usize = 128;

/// The inbound request id, if present and well-formed.
fn inbound_request_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LENGTH
                && id
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        })
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = inbound_request_id(request.headers())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", request_id.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    #[test]
    fn test_keeps_upstream_id() {
        let h = headers("cf-7a9b2c_1.0");
        assert_eq!(inbound_request_id(&h), Some("cf-7a9b2c_1.0"));
    }

    #[test]
    fn test_rejects_suspicious_ids() {
        assert_eq!(inbound_request_id(&headers("a b")), None);
        assert_eq!(inbound_request_id(&headers("")), None);
        assert_eq!(inbound_request_id(&headers(&"x".repeat(200))), None);
        assert_eq!(inbound_request_id(&HeaderMap::new()), None);
    }
}
