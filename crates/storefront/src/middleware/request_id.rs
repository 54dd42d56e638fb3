//! Request ID middleware.
//!
//! Every request gets an id: the upstream proxy's `x-request-id` when it is
//! a sane token, otherwise a fresh UUID v4. The id is recorded in the
//! tracing span, tagged in Sentry and echoed back in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_UPSTREAM_LEN: usize = 128;

/// Accept an upstream id only if it is short visible ASCII.
fn upstream_id(raw: Option<&HeaderValue>) -> Option<String> {
    let value = raw?.to_str().ok()?.trim();
    let ok = !value.is_empty()
        && value.len() <= MAX_UPSTREAM_LEN
        && value.bytes().all(|b| b.is_ascii_graphic());
    ok.then(|| value.to_owned())
}

/// Attach a request id to the span, the Sentry scope and the response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = upstream_id(request.headers().get(REQUEST_ID_HEADER))
        .unwrap_or_else(|| Uuid::new_v4().to_string());

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
mod tests {
    use super::*;

    #[test]
    fn test_upstream_id_accepted() {
        let header = HeaderValue::from_static("cf-7d2a9b");
        assert_eq!(upstream_id(Some(&header)).as_deref(), Some("cf-7d2a9b"));
    }

    #[test]
    fn test_upstream_id_rejected() {
        assert_eq!(upstream_id(None), None);
        assert_eq!(upstream_id(Some(&HeaderValue::from_static(""))), None);
        assert_eq!(
            upstream_id(Some(&HeaderValue::from_static("has space"))),
            None
        );
        let long = "a".repeat(MAX_UPSTREAM_LEN + 1);
        let header = HeaderValue::from_str(&long).unwrap_or(HeaderValue::from_static(""));
        assert_eq!(upstream_id(Some(&header)), None);
    }
}
