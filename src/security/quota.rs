//! Route → quota lookup.
//!
//! # Responsibilities
//! - Describe which (method, path prefix) pairs are throttled and how hard
//! - Resolve an incoming request to at most one quota
//!
//! # Design Decisions
//! - Path matching is prefix-based and case-sensitive, like the routing matchers
//! - Longest prefix wins when several routes share a method
//! - Table is built once and never mutated; shared via Arc

use axum::http::Method;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::QuotaConfig;

/// A (method, path prefix) admission key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    method: Method,
    prefix: Arc<str>,
}

impl Route {
    pub fn new(method: Method, prefix: impl Into<Arc<str>>) -> Self {
        Self {
            method,
            prefix: prefix.into(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if a request with this method and path falls under the route.
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method == method && path.starts_with(&*self.prefix)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.prefix)
    }
}

/// Sustained rate plus instantaneous headroom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateQuota {
    /// Tokens regenerated per minute.
    pub per_minute: f64,
    /// Requests allowed above the steady-state permit.
    pub burst: u32,
}

impl RateQuota {
    pub fn new(per_minute: f64, burst: u32) -> Self {
        Self { per_minute, burst }
    }

    /// Shorthand for a quota of `n` requests per minute.
    pub fn per_min(n: u32) -> Self {
        Self::new(n as f64, 0)
    }

    /// Burst headroom plus the steady-state permit.
    pub fn capacity(&self) -> f64 {
        self.burst as f64 + 1.0
    }

    pub fn per_second(&self) -> f64 {
        self.per_minute / 60.0
    }

    /// Builder-style burst override.
    pub fn with_burst(mut self, burst: u32) -> Self {
        self.burst = burst;
        self
    }
}

/// Immutable mapping from route to quota.
#[derive(Debug, Clone, Default)]
pub struct QuotaTable {
    entries: Vec<(Route, RateQuota)>,
}

impl QuotaTable {
    pub fn new(entries: impl IntoIterator<Item = (Route, RateQuota)>) -> Self {
        let mut entries: Vec<_> = entries.into_iter().collect();
        // Longest prefix first so the first hit is the most specific one
        entries.sort_by(|a, b| b.0.prefix.len().cmp(&a.0.prefix.len()));
        Self { entries }
    }

    /// Built-in table: one request per minute, no burst, on the endpoints that
    /// issue credentials or destroy data.
    pub fn security_defaults() -> Self {
        Self::new([
            (Route::new(Method::POST, "/auth/"), RateQuota::per_min(1)),
            (Route::new(Method::PUT, "/auth/"), RateQuota::per_min(1)),
            (Route::new(Method::DELETE, "/store/"), RateQuota::per_min(1)),
        ])
    }

    /// Build from configured entries, falling back to the built-in table when none are given.
    ///
    /// Entries are expected to have passed `validate_config`; malformed methods are skipped.
    pub fn from_config(quotas: &[QuotaConfig]) -> Self {
        if quotas.is_empty() {
            return Self::security_defaults();
        }

        Self::new(quotas.iter().filter_map(|q| {
            let method = match Method::from_str(&q.method.to_uppercase()) {
                Ok(m) => m,
                Err(_) => {
                    tracing::warn!(method = %q.method, "Skipping quota with invalid method");
                    return None;
                }
            };
            Some((
                Route::new(method, q.path_prefix.as_str()),
                RateQuota::new(q.per_minute, q.burst),
            ))
        }))
    }

    /// Find the quota governing a request, if any.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<(&Route, &RateQuota)> {
        self.entries
            .iter()
            .find(|(route, _)| route.matches(method, path))
            .map(|(route, quota)| (route, quota))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching() {
        let table = QuotaTable::security_defaults();

        let (route, quota) = table.lookup(&Method::POST, "/auth/login").unwrap();
        assert_eq!(route.prefix(), "/auth/");
        assert_eq!(*quota, RateQuota::per_min(1));

        assert!(table.lookup(&Method::PUT, "/auth/token/xyz").is_some());
        assert!(table.lookup(&Method::DELETE, "/store/").is_some());
    }

    #[test]
    fn test_method_must_match() {
        let table = QuotaTable::security_defaults();
        assert!(table.lookup(&Method::GET, "/auth/login").is_none());
        assert!(table.lookup(&Method::GET, "/store/").is_none());
    }

    #[test]
    fn test_unknown_route_is_unlimited() {
        let table = QuotaTable::security_defaults();
        assert!(table.lookup(&Method::POST, "/health").is_none());
        // Prefix is case-sensitive and not a substring search
        assert!(table.lookup(&Method::POST, "/AUTH/login").is_none());
        assert!(table.lookup(&Method::POST, "/v1/auth/login").is_none());
    }

    #[test]
    fn test_most_specific_wins() {
        let table = QuotaTable::new([
            (Route::new(Method::POST, "/api/"), RateQuota::per_min(100)),
            (Route::new(Method::POST, "/api/auth/"), RateQuota::per_min(1)),
        ]);

        let (route, _) = table.lookup(&Method::POST, "/api/auth/login").unwrap();
        assert_eq!(route.prefix(), "/api/auth/");

        let (route, _) = table.lookup(&Method::POST, "/api/items").unwrap();
        assert_eq!(route.prefix(), "/api/");
    }

    #[test]
    fn test_from_config() {
        let table = QuotaTable::from_config(&[QuotaConfig {
            method: "post".into(),
            path_prefix: "/login".into(),
            per_minute: 10.0,
            burst: 4,
        }]);
        assert_eq!(table.len(), 1);

        let (_, quota) = table.lookup(&Method::POST, "/login").unwrap();
        assert_eq!(quota.capacity(), 5.0);

        assert_eq!(QuotaTable::from_config(&[]).len(), 3);
    }
}
