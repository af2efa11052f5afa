//! keyhold service core library.
//!
//! Request admission (per-route token buckets), CORS decoration, service
//! lifecycle, and account administration over a pluggable key-value store.

pub mod accounts;
pub mod app;
pub mod cli;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;
pub mod storage;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{LifecycleController, Shutdown};
