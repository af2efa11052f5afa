//! Ordered request-processing stages.
//!
//! Every stage either answers a request itself or forwards it to the next
//! stage via [`Next`]. The chain is assembled once at startup and applied to
//! the application router so that the first stage added is the outermost.

use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
    Router,
};
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// A process-or-forward step in the request pipeline.
pub trait Stage: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Handle `request`, either producing a response directly or calling `next`.
    fn process<'a>(&'a self, request: Request<Body>, next: Next) -> BoxFuture<'a, Response>;
}

/// An ordered list of stages, outermost first.
#[derive(Clone, Default)]
pub struct Chain {
    stages: Vec<Arc<dyn Stage>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage inside the ones already added.
    pub fn stage(self, stage: impl Stage) -> Self {
        self.shared_stage(Arc::new(stage))
    }

    /// Append a stage that is also referenced elsewhere (e.g. by a background task).
    pub fn shared_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Wrap `inner` so requests pass through every stage in order.
    pub fn wrap(self, inner: Router) -> Router {
        // Router::layer makes the last layer the outermost one
        self.stages.into_iter().rev().fold(inner, |router, stage| {
            router.layer(middleware::from_fn(move |request: Request<Body>, next: Next| {
                let stage = stage.clone();
                async move { stage.process(request, next).await }
            }))
        })
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderValue, routing::get};
    use tower::ServiceExt;

    /// Appends its name to the `x-trail` response header.
    struct Trail(&'static str);

    impl Stage for Trail {
        fn name(&self) -> &'static str {
            self.0
        }

        fn process<'a>(&'a self, request: Request<Body>, next: Next) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                let mut response = next.run(request).await;
                let trail = response
                    .headers()
                    .get("x-trail")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| format!("{},{}", v, self.0))
                    .unwrap_or_else(|| self.0.to_string());
                response
                    .headers_mut()
                    .insert("x-trail", HeaderValue::from_str(&trail).unwrap());
                response
            })
        }
    }

    #[tokio::test]
    async fn test_first_stage_is_outermost() {
        let chain = Chain::new().stage(Trail("outer")).stage(Trail("inner"));
        assert_eq!(chain.names(), vec!["outer", "inner"]);

        let app = chain.wrap(Router::new().route("/", get(|| async { "ok" })));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        // Inner stage decorates first on the way out
        assert_eq!(response.headers()["x-trail"], "inner,outer");
    }
}
