//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files. Keys
//! are camelCase in the file (`tlsCert`, `requireTLS`, ...).

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and HTTP surface settings.
    pub server: ServerConfig,

    /// Key-value storage backend settings.
    pub storage: StorageConfig,

    /// Outgoing mail settings (consumed by the application handler only).
    pub email: EmailConfig,

    /// Request admission (rate limiting) settings.
    pub admission: AdmissionConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,

    /// Path to TLS certificate file (PEM). TLS is enabled only if both cert and key are set.
    pub tls_cert: String,

    /// Path to TLS private key file (PEM).
    pub tls_key: String,

    /// Reject requests that did not arrive over TLS.
    #[serde(rename = "requireTLS")]
    pub require_tls: bool,

    /// Path to the static assets directory.
    pub assets_path: String,

    /// Address error reports are sent to.
    pub notify_email: String,

    /// Public host name. Empty means "derive from the listener".
    pub host_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            tls_cert: String::new(),
            tls_key: String::new(),
            require_tls: false,
            assets_path: "assets".to_string(),
            notify_email: String::new(),
            host_name: String::new(),
        }
    }
}

impl ServerConfig {
    /// TLS is served only when both certificate and key paths are configured.
    pub fn tls_enabled(&self) -> bool {
        !self.tls_cert.is_empty() && !self.tls_key.is_empty()
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    /// Directory holding the database files.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "db".to_string(),
        }
    }
}

/// Mail server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailConfig {
    pub server: String,
    pub port: String,
    pub user: String,
    pub password: String,
}

/// Admission gate configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdmissionConfig {
    /// Enable the admission stage.
    pub enabled: bool,

    /// Quotas replacing the built-in table when non-empty.
    pub quotas: Vec<QuotaConfig>,

    /// Buckets untouched for this long are evicted.
    pub idle_evict_secs: u64,

    /// How often the sweeper looks for idle buckets.
    pub sweep_interval_secs: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quotas: Vec::new(),
            idle_evict_secs: 600,
            sweep_interval_secs: 60,
        }
    }
}

/// One quota table entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaConfig {
    /// HTTP method (e.g. "POST").
    pub method: String,

    /// Path prefix to match.
    pub path_prefix: String,

    /// Sustained requests per minute.
    pub per_minute: f64,

    /// Extra requests allowed instantaneously.
    #[serde(default)]
    pub burst: u32,
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
