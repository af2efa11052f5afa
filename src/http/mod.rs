//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (request ID, tracing, plaintext or rustls)
//!     → chain.rs (CORS → TLS policy → admission, each process-or-forward)
//!     → application handler router
//!     → Send to client
//! ```

pub mod chain;
pub mod server;

pub use chain::{Chain, Stage};
pub use server::{HttpServer, ServeError};
