//! HTTP server setup.
//!
//! # Responsibilities
//! - Wrap the application router in the security chain
//! - Wire up ambient middleware (tracing, request ID)
//! - Serve plaintext or TLS on an already-bound listener
//! - Stop accepting when the shutdown token fires

use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::chain::Chain;
use crate::net::tls::{load_tls_config, TlsError};

/// Error type for serving.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("TLS configuration error: {0}")]
    Tls(#[from] TlsError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP(S) server for the service.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a server that runs `app` behind `chain`.
    pub fn new(config: ServerConfig, app: Router, chain: Chain) -> Self {
        tracing::debug!(stages = ?chain, "Building request chain");
        let router = Self::build_router(app, chain);
        Self { router, config }
    }

    fn build_router(app: Router, chain: Chain) -> Router {
        chain
            .wrap(app)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve until `shutdown` is cancelled or the listener fails.
    pub async fn run(self, listener: TcpListener, shutdown: CancellationToken) -> Result<(), ServeError> {
        let addr = listener.local_addr()?;
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        if self.config.tls_enabled() {
            let tls = load_tls_config(Path::new(&self.config.tls_cert), Path::new(&self.config.tls_key))
                .await?;

            let handle = axum_server::Handle::new();
            let trigger = handle.clone();
            tokio::spawn(async move {
                shutdown.cancelled().await;
                trigger.shutdown();
            });

            tracing::info!(address = %addr, "HTTPS server starting");
            axum_server::from_tcp_rustls(listener.into_std()?, tls)
                .handle(handle)
                .serve(app)
                .await?;
        } else {
            tracing::info!(address = %addr, "HTTP server starting");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await?;
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
