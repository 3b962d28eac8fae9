//! TLS transport over TCP using rustls.
//!
//! Certificate validation is left entirely to rustls. Trust roots come
//! from `webpki-roots` unless a PEM bundle is supplied.

use std::io;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig as RustlsConfig, RootCertStore};
use tokio::net::TcpStream;

use super::{BoxFuture, BoxedStream, Connector};
use crate::config::ClientConfig;
use crate::error::{NotifyError, Result};

/// Connector performing a TCP connect followed by a TLS handshake.
#[derive(Clone)]
pub struct TlsConnector {
    connector: tokio_rustls::TlsConnector,
    server_name: Option<String>,
}

impl TlsConnector {
    /// Create a connector trusting the bundled web PKI roots.
    pub fn new() -> Result<Self> {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        Ok(Self::from_rustls(Arc::new(build_rustls_config(roots)?)))
    }

    /// Create a connector trusting only the certificates in a PEM file.
    pub fn with_ca_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read(path)
            .map_err(|e| NotifyError::Config(format!("failed to read {}: {e}", path.display())))?;
        let roots = load_roots(&pem)
            .map_err(|e| NotifyError::Config(format!("{}: {e}", path.display())))?;
        Ok(Self::from_rustls(Arc::new(build_rustls_config(roots)?)))
    }

    /// Wrap an existing rustls client configuration.
    pub fn from_rustls(config: Arc<RustlsConfig>) -> Self {
        Self {
            connector: tokio_rustls::TlsConnector::from(config),
            server_name: None,
        }
    }

    /// Build the connector described by a client configuration.
    pub fn from_client_config(config: &ClientConfig) -> Result<Self> {
        let connector = match &config.ca_file {
            Some(path) => Self::with_ca_file(path)?,
            None => Self::new()?,
        };
        Ok(match &config.server_name {
            Some(name) => connector.with_server_name(name.clone()),
            None => connector,
        })
    }

    /// Verify the server against `name` instead of the connect address.
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }
}

impl Connector for TlsConnector {
    fn connect<'a>(&'a self, address: &'a str, port: u16) -> BoxFuture<'a, io::Result<BoxedStream>> {
        Box::pin(async move {
            let name = self.server_name.as_deref().unwrap_or(address);
            let server_name = ServerName::try_from(name.to_owned()).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid server name {name:?}: {e}"),
                )
            })?;

            let tcp = TcpStream::connect((address, port)).await?;
            tcp.set_nodelay(true)?;
            tracing::debug!(address, port, "TCP connected, starting TLS handshake");

            let tls = self.connector.connect(server_name, tcp).await?;
            Ok(Box::new(tls) as BoxedStream)
        })
    }
}

fn build_rustls_config(roots: RootCertStore) -> Result<RustlsConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = RustlsConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| NotifyError::Config(format!("TLS configuration error: {e}")))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}

fn load_roots(pem: &[u8]) -> std::result::Result<RootCertStore, String> {
    let certs = CertificateDer::pem_slice_iter(pem)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid PEM data: {e}"))?;
    if certs.is_empty() {
        return Err("no certificates found".to_string());
    }

    let mut roots = RootCertStore::empty();
    for cert in certs {
        roots
            .add(cert)
            .map_err(|e| format!("failed to add CA certificate: {e}"))?;
    }
    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_connector_builds() {
        assert!(TlsConnector::new().is_ok());
    }

    #[test]
    fn test_load_roots_rejects_empty_bundle() {
        let err = load_roots(b"").unwrap_err();
        assert!(err.contains("no certificates"));
    }

    #[test]
    fn test_missing_ca_file() {
        let result = TlsConnector::with_ca_file("/nonexistent/ca.pem");
        assert!(matches!(result, Err(NotifyError::Config(_))));
    }

    #[tokio::test]
    async fn test_invalid_server_name_is_io_error() {
        let connector = TlsConnector::new().unwrap().with_server_name("not a hostname!");

        let err = match connector.connect("127.0.0.1", 1).await {
            Err(e) => e,
            Ok(_) => panic!("connect should fail"),
        };
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_refused_connection_is_io_error() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let connector = TlsConnector::new().unwrap();
        assert!(connector.connect("127.0.0.1", port).await.is_err());
    }
}
