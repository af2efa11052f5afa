//! Built-in application handler: storage lifecycle plus status endpoints.

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::app::{AppError, AppHandler};
use crate::config::ServerConfig;
use crate::storage::Storage;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub storage_open: bool,
}

#[derive(Clone)]
struct ApiState {
    storage: Arc<dyn Storage>,
}

/// Handler that owns the server's long-lived storage session.
pub struct ApiHandler {
    storage: Arc<dyn Storage>,
    config: ServerConfig,
}

impl ApiHandler {
    pub fn new(storage: Arc<dyn Storage>, config: ServerConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl AppHandler for ApiHandler {
    fn init(&self) -> Result<(), AppError> {
        self.storage.open()?;
        tracing::info!(
            assets_path = %self.config.assets_path,
            notify_email = %self.config.notify_email,
            "Application handler initialized"
        );
        Ok(())
    }

    fn clean_up(&self) -> Result<(), AppError> {
        tracing::info!("Closing storage");
        self.storage.close()?;
        Ok(())
    }

    fn router(&self) -> Router {
        let state = ApiState {
            storage: self.storage.clone(),
        };

        Router::new()
            .route("/health", get(get_health))
            .route("/version", get(get_version))
            .fallback(not_found)
            .with_state(state)
    }
}

async fn get_health(State(state): State<ApiState>) -> impl IntoResponse {
    let storage_open = state.storage.is_open();
    let status = if storage_open {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(SystemStatus {
            version: env!("CARGO_PKG_VERSION"),
            status: if storage_open { "operational" } else { "degraded" },
            storage_open,
        }),
    )
}

async fn get_version() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") }))
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "not_found",
            "path": uri.path(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn handler() -> (ApiHandler, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (ApiHandler::new(storage.clone(), ServerConfig::default()), storage)
    }

    #[test]
    fn test_init_and_cleanup_manage_storage() {
        let (handler, storage) = handler();
        handler.init().unwrap();
        assert!(storage.is_open());

        handler.clean_up().unwrap();
        assert!(!storage.is_open());

        // Second cleanup has nothing to close
        assert!(matches!(handler.clean_up(), Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_health_reflects_storage() {
        let (handler, _) = handler();
        let app = handler.router();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        handler.init().unwrap();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let (handler, _) = handler();
        let response = handler
            .router()
            .oneshot(Request::builder().uri("/store/x").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
