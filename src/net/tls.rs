//! TLS termination material.

use axum_server::tls_rustls::RustlsConfig;
use std::path::{Path, PathBuf};

/// Error type for certificate loading.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("{role} file not found: {}", .path.display())]
    Missing { role: &'static str, path: PathBuf },
    #[error("Invalid certificate or key: {0}")]
    Invalid(#[source] std::io::Error),
}

fn require_file(role: &'static str, path: &Path) -> Result<(), TlsError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(TlsError::Missing {
            role,
            path: path.to_path_buf(),
        })
    }
}

/// Build a rustls server config from a PEM certificate chain and private key.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    require_file("Certificate", cert_path)?;
    require_file("Private key", key_path)?;

    let config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(TlsError::Invalid)?;
    tracing::debug!(cert = %cert_path.display(), "TLS certificate loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_certificate() {
        let err = load_tls_config(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, TlsError::Missing { role: "Certificate", .. }));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        std::fs::write(&cert, "cert").unwrap();

        let err = load_tls_config(&cert, &dir.path().join("key.pem")).await.unwrap_err();
        assert!(matches!(err, TlsError::Missing { role: "Private key", .. }));
    }

    #[tokio::test]
    async fn test_garbage_pem_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");
        std::fs::write(&cert, "not a certificate").unwrap();
        std::fs::write(&key, "not a key").unwrap();

        assert!(matches!(load_tls_config(&cert, &key).await, Err(TlsError::Invalid(_))));
    }
}
