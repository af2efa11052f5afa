//! Per-route, per-client admission control.
//!
//! Each (route, client) pair owns a token bucket holding at most `burst + 1`
//! tokens. Buckets refill continuously at the route's per-minute rate and are
//! created lazily on the first matching request.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::http::chain::Stage;
use crate::observability::metrics;
use crate::security::quota::{QuotaTable, RateQuota, Route};

/// Identity used when a request carries no connection info.
const UNKNOWN_CLIENT: &str = "unknown";

/// A token bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn refill(&mut self, quota: &RateQuota, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * quota.per_second()).min(quota.capacity());
        // Never move the clock backwards when callers race with older timestamps
        if now > self.last_update {
            self.last_update = now;
        }
    }

    /// Take one token, or report how long until one is available.
    fn try_acquire(&mut self, quota: &RateQuota, now: Instant) -> Result<(), Duration> {
        self.refill(quota, now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(missing / quota.per_second()))
        }
    }

    /// True once the bucket has been idle long enough to be full again.
    fn is_idle(&self, quota: &RateQuota, max_idle: Duration, now: Instant) -> bool {
        let idle = now.saturating_duration_since(self.last_update);
        let refilled = self.tokens + idle.as_secs_f64() * quota.per_second();
        idle >= max_idle && refilled >= quota.capacity()
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// No quota covers the request.
    Unlimited,
    /// A token was consumed.
    Admitted,
    /// The bucket is empty.
    Rejected { route: Route, retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Admission::Rejected { .. })
    }
}

/// Stateful rate limiter keyed by (route, client).
pub struct AdmissionGate {
    table: QuotaTable,
    buckets: DashMap<(Route, String), TokenBucket>,
}

impl AdmissionGate {
    pub fn new(table: QuotaTable) -> Self {
        Self {
            table,
            buckets: DashMap::new(),
        }
    }

    pub fn table(&self) -> &QuotaTable {
        &self.table
    }

    /// Number of live buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Admit one request from `client` on `route`.
    ///
    /// Routes that are not in the table are always admitted.
    pub fn admit(&self, client: &str, route: &Route) -> bool {
        self.check(client, route.method(), route.prefix()).is_allowed()
    }

    /// Classify a request and consume a token if it is covered by a quota.
    pub fn check(&self, client: &str, method: &Method, path: &str) -> Admission {
        self.check_at(client, method, path, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, client: &str, method: &Method, path: &str, now: Instant) -> Admission {
        let Some((route, quota)) = self.table.lookup(method, path) else {
            return Admission::Unlimited;
        };

        // The entry guard holds the shard lock, so refill and decrement are one step
        let mut bucket = self
            .buckets
            .entry((route.clone(), client.to_string()))
            .or_insert_with(|| TokenBucket::new(quota.capacity(), now));

        match bucket.try_acquire(quota, now) {
            Ok(()) => Admission::Admitted,
            Err(retry_after) => Admission::Rejected {
                route: route.clone(),
                retry_after,
            },
        }
    }

    /// Drop buckets that have been idle for at least `max_idle` and are full again.
    ///
    /// Evicting a full bucket is indistinguishable from keeping it, so this
    /// never changes an admission decision.
    pub fn evict_idle(&self, max_idle: Duration, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|(route, _), bucket| {
            match self.table.lookup(route.method(), route.prefix()) {
                Some((_, quota)) => !bucket.is_idle(quota, max_idle, now),
                None => false,
            }
        });
        let evicted = before.saturating_sub(self.buckets.len());
        metrics::record_bucket_count(self.buckets.len());
        evicted
    }

    /// Periodically evict idle buckets until `token` is cancelled.
    pub async fn run_sweeper(self: Arc<Self>, max_idle: Duration, every: Duration, token: CancellationToken) {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = self.evict_idle(max_idle, Instant::now());
                    if evicted > 0 {
                        tracing::debug!(evicted, remaining = self.bucket_count(), "Evicted idle admission buckets");
                    }
                }
            }
        }

        tracing::debug!("Admission sweeper stopped");
    }
}

/// Derive the client identity from the peer address.
fn client_identity(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn rejection(retry_after: Duration) -> Response {
    let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
    let mut response = (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    response
}

impl Stage for AdmissionGate {
    fn name(&self) -> &'static str {
        "admission"
    }

    fn process<'a>(&'a self, request: Request<Body>, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let client = client_identity(&request);
            let admission = self.check(&client, request.method(), request.uri().path());

            match admission {
                Admission::Unlimited => next.run(request).await,
                Admission::Admitted => {
                    metrics::record_admitted();
                    metrics::record_bucket_count(self.bucket_count());
                    next.run(request).await
                }
                Admission::Rejected { route, retry_after } => {
                    tracing::warn!(client = %client, route = %route, ?retry_after, "Rate limit exceeded");
                    metrics::record_rate_limited(&route.to_string());
                    rejection(retry_after)
                }
            }
        })
    }
}
