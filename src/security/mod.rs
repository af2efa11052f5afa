//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (answer pre-flight, decorate every response)
//!     → tls_policy.rs (reject plaintext when TLS is required)
//!     → rate_limit.rs (per-route, per-client token buckets from quota.rs)
//!     → Pass to application handler
//! ```
//!
//! # Design Decisions
//! - CORS sits outside admission so rejections still carry CORS headers
//! - Admission rejections are responses, never errors
//! - Unconfigured routes are never throttled

pub mod cors;
pub mod quota;
pub mod rate_limit;
pub mod tls_policy;

pub use cors::CorsGate;
pub use quota::{QuotaTable, RateQuota, Route};
pub use rate_limit::{Admission, AdmissionGate};
pub use tls_policy::RequireTls;
