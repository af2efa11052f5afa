//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs, controller.rs):
//!     Resolved config → handler init (opens storage) → build chain → bind → serve
//!
//! Shutdown (shutdown.rs, controller.rs):
//!     Signal received → cancel token → cleanup once → exit status
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds only after the handler is initialized
//! - Shutdown is best-effort: no drain of in-flight requests

pub mod controller;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use controller::{Exit, LifecycleController, LifecycleError, LifecycleState};
pub use shutdown::Shutdown;
