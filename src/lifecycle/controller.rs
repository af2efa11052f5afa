//! Service lifecycle controller.
//!
//! # States
//! ```text
//! Created ──init──▶ Initialized ──bind──▶ Serving ──signal──▶ ShuttingDown ──▶ Terminated
//!    │                   │                   │
//!    └── init error ─────┴── bind error ─────┴── serve error ──▶ Terminated (exit 1)
//! ```
//!
//! # Design Decisions
//! - Cleanup runs at most once, whichever path reaches it first
//! - No connection drain: cleanup may overlap in-flight requests
//! - Exit status mirrors cleanup success

use std::sync::{Arc, OnceLock};
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::app::{AppError, AppHandler};
use crate::config::AppConfig;
use crate::http::{HttpServer, ServeError};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::lifecycle::startup::{build_chain, spawn_sweeper};
use crate::net::listener::{self, ListenerError};

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Initialized,
    Serving,
    ShuttingDown,
    Terminated,
}

/// How the process should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Clean,
    Failed,
}

impl Exit {
    pub fn code(self) -> i32 {
        match self {
            Exit::Clean => 0,
            Exit::Failed => 1,
        }
    }
}

/// Error type for startup and serving.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Initialization failed: {0}")]
    Init(#[from] AppError),
    #[error(transparent)]
    Listen(#[from] ListenerError),
    #[error("Server failed: {0}")]
    Serve(#[from] ServeError),
}

/// Owns startup, serving, and shutdown sequencing for one handler.
pub struct LifecycleController {
    config: AppConfig,
    handler: Arc<dyn AppHandler>,
    shutdown: Shutdown,
    state: watch::Sender<LifecycleState>,
    cleanup: OnceLock<bool>,
}

impl LifecycleController {
    pub fn new(config: AppConfig, handler: Arc<dyn AppHandler>) -> Self {
        let (state, _) = watch::channel(LifecycleState::Created);
        Self {
            config,
            handler,
            shutdown: Shutdown::new(),
            state,
            cleanup: OnceLock::new(),
        }
    }

    /// Use an externally owned shutdown signal.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    fn transition(&self, next: LifecycleState) {
        let prev = self.state.send_replace(next);
        tracing::debug!(from = ?prev, to = ?next, "Lifecycle transition");
    }

    /// `Created → Initialized`: let the handler acquire its resources.
    pub fn initialize(&self) -> Result<(), LifecycleError> {
        if let Err(e) = self.handler.init() {
            self.transition(LifecycleState::Terminated);
            return Err(e.into());
        }
        self.transition(LifecycleState::Initialized);
        Ok(())
    }

    /// Bind the configured port. A failure releases the handler's resources.
    pub async fn bind(&self) -> Result<TcpListener, LifecycleError> {
        let addr = listener::bind_address(self.config.server.port);
        match listener::bind(addr).await {
            Ok(listener) => Ok(listener),
            Err(e) => {
                self.terminate();
                Err(e.into())
            }
        }
    }

    /// Run the handler's cleanup exactly once and report whether it succeeded.
    pub fn clean_up(&self) -> bool {
        *self.cleanup.get_or_init(|| match self.handler.clean_up() {
            Ok(()) => {
                tracing::info!("Cleanup complete");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Cleanup failed");
                false
            }
        })
    }

    fn terminate(&self) -> Exit {
        self.transition(LifecycleState::ShuttingDown);
        let cleaned = self.clean_up();
        self.transition(LifecycleState::Terminated);
        if cleaned {
            Exit::Clean
        } else {
            Exit::Failed
        }
    }

    /// `Initialized → Serving → … → Terminated` on an already-bound listener.
    ///
    /// Returns once shutdown is triggered (or the server stops on its own) and
    /// cleanup has run.
    pub async fn serve(&self, listener: TcpListener) -> Result<Exit, LifecycleError> {
        let security = build_chain(&self.config);
        if let Some(gate) = &security.admission {
            spawn_sweeper(gate.clone(), &self.config, &self.shutdown);
        }

        let server = HttpServer::new(self.config.server.clone(), self.handler.router(), security.chain);
        let host = if self.config.server.host_name.is_empty() {
            listener.local_addr().map(|a| a.to_string()).unwrap_or_default()
        } else {
            self.config.server.host_name.clone()
        };
        tracing::info!(host = %host, tls = self.config.server.tls_enabled(), "Serving");
        self.transition(LifecycleState::Serving);

        let outcome = tokio::select! {
            _ = self.shutdown.triggered() => None,
            result = server.run(listener, self.shutdown.token()) => Some(result),
        };

        match outcome {
            None => Ok(self.terminate()),
            Some(Ok(())) if self.shutdown.is_triggered() => Ok(self.terminate()),
            Some(Ok(())) => {
                tracing::warn!("Server stopped without a shutdown signal");
                Ok(self.terminate())
            }
            Some(Err(e)) => {
                self.terminate();
                Err(e.into())
            }
        }
    }

    async fn start(&self) -> Result<Exit, LifecycleError> {
        self.initialize()?;
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Full lifecycle, including OS signal handling. Never returns before cleanup.
    pub async fn run(&self) -> Exit {
        let signals = tokio::spawn(signals::trigger_on_signal(self.shutdown.clone()));

        let exit = match self.start().await {
            Ok(exit) => exit,
            Err(e) => {
                tracing::error!(error = %e, "Startup failed");
                Exit::Failed
            }
        };

        signals.abort();
        self.shutdown.trigger();
        tracing::info!(code = exit.code(), "Shutdown complete");
        exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct MockHandler {
        fail_init: bool,
        fail_cleanup: bool,
        inits: AtomicUsize,
        cleanups: AtomicUsize,
    }

    impl AppHandler for MockHandler {
        fn init(&self) -> Result<(), AppError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                return Err(AppError::Other("storage unavailable".into()));
            }
            Ok(())
        }

        fn clean_up(&self) -> Result<(), AppError> {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
            if self.fail_cleanup {
                return Err(AppError::Other("close failed".into()));
            }
            Ok(())
        }

        fn router(&self) -> Router {
            Router::new().route("/health", get(|| async { "ok" }))
        }
    }

    fn controller(handler: Arc<MockHandler>) -> LifecycleController {
        let mut config = AppConfig::default();
        config.server.port = 0;
        LifecycleController::new(config, handler)
    }

    async fn serve_then_signal(handler: Arc<MockHandler>) -> Exit {
        let controller = Arc::new(controller(handler));
        controller.initialize().unwrap();
        let listener = controller.bind().await.unwrap();

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.serve(listener).await })
        };

        let mut states = controller.subscribe();
        states
            .wait_for(|s| *s == LifecycleState::Serving)
            .await
            .unwrap();
        controller.shutdown().trigger();

        let exit = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("serve did not return")
            .unwrap()
            .unwrap();
        assert_eq!(controller.state(), LifecycleState::Terminated);
        exit
    }

    #[tokio::test]
    async fn test_signal_runs_cleanup_once() {
        let handler = Arc::new(MockHandler::default());
        let exit = serve_then_signal(handler.clone()).await;

        assert_eq!(exit, Exit::Clean);
        assert_eq!(exit.code(), 0);
        assert_eq!(handler.cleanups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_cleanup_exits_one() {
        let handler = Arc::new(MockHandler {
            fail_cleanup: true,
            ..Default::default()
        });
        let exit = serve_then_signal(handler.clone()).await;

        assert_eq!(exit.code(), 1);
        assert_eq!(handler.cleanups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_init_failure_never_serves() {
        let handler = Arc::new(MockHandler {
            fail_init: true,
            ..Default::default()
        });
        let controller = controller(handler.clone());

        assert_eq!(controller.run().await, Exit::Failed);
        assert_eq!(controller.state(), LifecycleState::Terminated);
        assert_eq!(handler.inits.load(Ordering::SeqCst), 1);
        assert_eq!(handler.cleanups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bind_failure_cleans_up() {
        let taken = TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let handler = Arc::new(MockHandler::default());
        let mut config = AppConfig::default();
        config.server.port = port;
        let controller = LifecycleController::new(config, handler.clone());

        assert_eq!(controller.run().await, Exit::Failed);
        assert_eq!(handler.cleanups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bad_certificate_is_fatal() {
        let handler = Arc::new(MockHandler::default());
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.server.tls_cert = "/nonexistent/cert.pem".into();
        config.server.tls_key = "/nonexistent/key.pem".into();
        let controller = LifecycleController::new(config, handler.clone());

        let exit = tokio::time::timeout(Duration::from_secs(5), controller.run())
            .await
            .expect("run did not return");
        assert_eq!(exit, Exit::Failed);
        assert_eq!(handler.cleanups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_cleanup_runs_once() {
        let handler = Arc::new(MockHandler::default());
        let controller = Arc::new(controller(handler.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let controller = controller.clone();
                std::thread::spawn(move || controller.clean_up())
            })
            .collect();

        for h in handles {
            assert!(h.join().unwrap());
        }
        assert_eq!(handler.cleanups.load(Ordering::SeqCst), 1);
    }
}
