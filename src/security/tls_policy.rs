//! Rejection of plaintext requests when TLS is mandatory.
//!
//! Only installed when `requireTLS` is set and the listener itself is
//! plaintext, i.e. TLS is expected to be terminated by a fronting proxy.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;

use crate::http::chain::Stage;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

#[derive(Debug, Clone, Copy, Default)]
pub struct RequireTls;

fn is_forwarded_https(request: &Request<Body>) -> bool {
    request
        .headers()
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .map(|proto| proto.eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

impl Stage for RequireTls {
    fn name(&self) -> &'static str {
        "require-tls"
    }

    fn process<'a>(&'a self, request: Request<Body>, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if is_forwarded_https(&request) {
                next.run(request).await
            } else {
                tracing::debug!(path = %request.uri().path(), "Rejecting insecure request");
                (StatusCode::FORBIDDEN, "Insecure connections are not allowed").into_response()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_proto() {
        let plain = Request::builder().body(Body::empty()).unwrap();
        assert!(!is_forwarded_https(&plain));

        let secure = Request::builder()
            .header(FORWARDED_PROTO, "HTTPS")
            .body(Body::empty())
            .unwrap();
        assert!(is_forwarded_https(&secure));
    }
}
