//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! clap flags / KEYHOLD_* env          config file (TOML)
//!          │                                 │
//!          └──────────► loader::resolve ◄────┘
//!                            │  (file wins wholesale)
//!                            ▼
//!                     validation.rs (semantic checks)
//!                            ▼
//!                     AppConfig (immutable for the run)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; the lifecycle controller owns it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve, ConfigError};
pub use schema::{
    AdmissionConfig, AppConfig, EmailConfig, ObservabilityConfig, QuotaConfig, ServerConfig,
    StorageConfig,
};
