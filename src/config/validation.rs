//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (rates > 0, known HTTP methods)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use axum::http::Method;
use std::str::FromStr;

use crate::config::schema::AppConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("server.tlsCert and server.tlsKey must be set together")]
    PartialTls,
    #[error("quota {index}: invalid method {method:?}")]
    InvalidMethod { index: usize, method: String },
    #[error("quota {index}: path prefix must start with '/'")]
    InvalidPrefix { index: usize },
    #[error("quota {index}: perMinute must be positive")]
    InvalidRate { index: usize },
    #[error("admission.sweepIntervalSecs must be positive")]
    ZeroSweepInterval,
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.tls_cert.is_empty() != config.server.tls_key.is_empty() {
        errors.push(ValidationError::PartialTls);
    }

    for (index, quota) in config.admission.quotas.iter().enumerate() {
        if Method::from_str(&quota.method.to_uppercase()).is_err() {
            errors.push(ValidationError::InvalidMethod {
                index,
                method: quota.method.clone(),
            });
        }
        if !quota.path_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix { index });
        }
        if quota.per_minute.is_nan() || quota.per_minute <= 0.0 {
            errors.push(ValidationError::InvalidRate { index });
        }
    }

    if config.admission.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::QuotaConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.server.tls_cert = "cert.pem".into();
        config.admission.quotas.push(QuotaConfig {
            method: "GE T".into(),
            path_prefix: "auth".into(),
            per_minute: 0.0,
            burst: 0,
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], ValidationError::PartialTls);
    }
}
