//! Configuration loading from disk and precedence resolution.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Pick the effective configuration for this run.
///
/// A config file replaces the flag/environment values wholesale: fields the
/// file leaves out fall back to the schema defaults, never to `from_flags`.
pub fn resolve(config_path: Option<&Path>, from_flags: AppConfig) -> Result<AppConfig, ConfigError> {
    match config_path {
        Some(path) => load_config(path),
        None => {
            validate_config(&from_flags).map_err(ConfigError::Validation)?;
            Ok(from_flags)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_replaces_flags_wholesale() {
        let file = write_config(
            r#"
            [server]
            port = 4000
            "#,
        );

        let mut flags = AppConfig::default();
        flags.server.port = 5000;
        flags.server.notify_email = "ops@example.com".into();
        flags.storage.path = "/var/lib/flags-db".into();

        let config = resolve(Some(file.path()), flags).unwrap();
        assert_eq!(config.server.port, 4000);
        // Not set in the file, and the flag value is discarded too
        assert_eq!(config.server.notify_email, "");
        assert_eq!(config.storage.path, "db");
    }

    #[test]
    fn test_flags_used_without_file() {
        let mut flags = AppConfig::default();
        flags.server.port = 5000;

        let config = resolve(None, flags.clone()).unwrap();
        assert_eq!(config, flags);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = resolve(Some(Path::new("/nonexistent/keyhold.toml")), AppConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let file = write_config("[server\nport = ");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_file_is_validation_error() {
        let file = write_config(
            r#"
            [server]
            tlsCert = "only-cert.pem"
            "#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));
    }
}
