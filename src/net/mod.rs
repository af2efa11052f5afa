//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured port
//!     → listener.rs (bind, fatal on conflict)
//!     → tls.rs (optional rustls config from PEM files)
//!     → Hand off to HTTP layer
//! ```

pub mod listener;
pub mod tls;
