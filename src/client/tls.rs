//! TLS client setup for HTTPS targets

use crate::error::{AppError, Result};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::{client::TlsStream, TlsConnector};

/// Build a rustls client configuration trusting the webpki root set
pub fn client_config() -> Result<rustls::ClientConfig> {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    client_config_with_roots(root_store)
}

/// Build a rustls client configuration trusting only `root_store`
pub fn client_config_with_roots(root_store: rustls::RootCertStore) -> Result<rustls::ClientConfig> {
    let mut config = rustls::ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(root_store)
        .with_no_client_auth();

    // The traced client speaks HTTP/1.1 only
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(config)
}

/// Performs TLS handshakes over established TCP connections
#[derive(Clone)]
pub struct TlsDialer {
    connector: TlsConnector,
}

impl TlsDialer {
    pub fn new() -> Result<Self> {
        Ok(Self::from_config(client_config()?))
    }

    /// Dialer trusting the given roots instead of the webpki set
    pub fn with_root_certificates(root_store: rustls::RootCertStore) -> Result<Self> {
        Ok(Self::from_config(client_config_with_roots(root_store)?))
    }

    pub fn from_config(config: rustls::ClientConfig) -> Self {
        Self {
            connector: TlsConnector::from(Arc::new(config)),
        }
    }

    /// Run the handshake for `host` over `stream`
    pub async fn handshake(&self, host: &str, stream: TcpStream) -> Result<TlsStream<TcpStream>> {
        let name = host.trim_start_matches('[').trim_end_matches(']');
        let server_name = ServerName::try_from(name.to_owned())
            .map_err(|e| AppError::tls(format!("Invalid TLS server name '{}': {}", host, e)))?;

        self.connector
            .connect(server_name, stream)
            .await
            .map_err(|e| AppError::tls(format!("TLS handshake with {} failed: {}", host, e)))
    }
}
