//! Application handler contract.
//!
//! The handler is the innermost layer of the request chain. The lifecycle
//! controller calls [`AppHandler::init`] once before serving and
//! [`AppHandler::clean_up`] once when the process is about to exit.

pub mod api;

use axum::Router;

use crate::storage::StorageError;

pub use api::ApiHandler;

/// Error type for handler initialization and cleanup.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Other(String),
}

/// Business-logic handler wrapped by the security chain.
pub trait AppHandler: Send + Sync + 'static {
    /// Acquire resources (e.g. open storage). Called once before serving.
    fn init(&self) -> Result<(), AppError>;

    /// Release resources. May run while requests are still in flight.
    fn clean_up(&self) -> Result<(), AppError>;

    /// Routes served by this handler.
    fn router(&self) -> Router;
}
