//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use keyhold::app::{ApiHandler, AppHandler};
use keyhold::config::AppConfig;
use keyhold::http::HttpServer;
use keyhold::lifecycle::startup::build_chain;
use keyhold::lifecycle::{Exit, LifecycleController, LifecycleError};
use keyhold::storage::{MemoryStorage, Storage};

/// Open in-memory storage.
pub fn open_storage() -> Arc<dyn Storage> {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    storage.open().unwrap();
    storage
}

/// Full router (request id, tracing, security chain, handler) without a socket.
pub fn service_router(config: &AppConfig) -> Router {
    let handler = ApiHandler::new(open_storage(), config.server.clone());
    let security = build_chain(config);
    HttpServer::new(config.server.clone(), handler.router(), security.chain).router()
}

/// Request carrying the peer address the admission gate keys on.
pub fn request_from(peer: &str, method: Method, path: &str) -> Request<Body> {
    let addr: SocketAddr = format!("{}:40000", peer).parse().unwrap();
    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

/// A running controller on a loopback port chosen by the OS.
pub struct RunningService {
    pub addr: SocketAddr,
    pub controller: Arc<LifecycleController>,
    pub task: JoinHandle<Result<Exit, LifecycleError>>,
}

/// Initialize `handler` and serve it on `127.0.0.1:0`.
pub async fn start_service(config: AppConfig, handler: Arc<dyn AppHandler>) -> RunningService {
    let controller = Arc::new(LifecycleController::new(config, handler));
    controller.initialize().unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let serving = controller.clone();
    let task = tokio::spawn(async move { serving.serve(listener).await });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    RunningService {
        addr,
        controller,
        task,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
