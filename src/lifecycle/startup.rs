//! Startup assembly.
//!
//! # Responsibilities
//! - Turn the resolved configuration into the ordered security chain
//! - Start background tasks the chain depends on
//!
//! # Design Decisions
//! - CORS is always the outermost stage
//! - TLS policy only applies when TLS is terminated upstream
//! - Admission can be disabled wholesale

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::http::chain::Chain;
use crate::lifecycle::shutdown::Shutdown;
use crate::security::{AdmissionGate, CorsGate, QuotaTable, RequireTls};

/// The chain plus a handle on the admission gate, if one was installed.
pub struct SecurityChain {
    pub chain: Chain,
    pub admission: Option<Arc<AdmissionGate>>,
}

/// Build the security chain for `config`.
pub fn build_chain(config: &AppConfig) -> SecurityChain {
    let mut chain = Chain::new().stage(CorsGate::new());

    if config.server.require_tls && !config.server.tls_enabled() {
        chain = chain.stage(RequireTls);
    }

    let admission = if config.admission.enabled {
        let table = QuotaTable::from_config(&config.admission.quotas);
        tracing::info!(routes = table.len(), "Admission quotas loaded");
        let gate = Arc::new(AdmissionGate::new(table));
        chain = chain.shared_stage(gate.clone());
        Some(gate)
    } else {
        tracing::warn!("Admission control disabled");
        None
    };

    SecurityChain { chain, admission }
}

/// Spawn the idle-bucket sweeper; it stops with `shutdown`.
pub fn spawn_sweeper(gate: Arc<AdmissionGate>, config: &AppConfig, shutdown: &Shutdown) {
    let max_idle = Duration::from_secs(config.admission.idle_evict_secs);
    let every = Duration::from_secs(config.admission.sweep_interval_secs.max(1));
    tokio::spawn(gate.run_sweeper(max_idle, every, shutdown.token()));
}
