//! Cross-origin header decoration.
//!
//! # Responsibilities
//! - Answer `OPTIONS` pre-flight requests without touching inner layers
//! - Attach permissive CORS headers to every other response, including
//!   rejections produced further down the chain
//!
//! # Design Decisions
//! - Stateless: the same headers for every origin
//! - Runs first in the chain so nothing downstream can bypass it

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;

use crate::http::chain::Stage;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept, Authorization, X-Request-Id";

/// Pre-flight answering, header-decorating chain stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorsGate;

impl CorsGate {
    pub fn new() -> Self {
        Self
    }

    /// Insert the cross-origin headers, replacing any set downstream.
    pub fn decorate(headers: &mut HeaderMap) {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
    }
}

impl Stage for CorsGate {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(&'a self, request: Request<Body>, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut response = if request.method() == Method::OPTIONS {
                tracing::trace!(path = %request.uri().path(), "Answering CORS pre-flight");
                StatusCode::NO_CONTENT.into_response()
            } else {
                next.run(request).await
            };

            Self::decorate(response.headers_mut());
            response
        })
    }
}
