//! Traced client tests against local mock HTTP and HTTPS servers

use super::*;
use crate::executor::LoadTest;
use rcgen::CertifiedKey;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Mock HTTP server for controlled request scenarios
struct MockHttpServer {
    server: MockServer,
}

impl MockHttpServer {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    fn url(&self, request_path: &str) -> Url {
        Url::parse(&format!("{}{}", self.server.uri(), request_path)).unwrap()
    }

    async fn mock_status(&self, request_path: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    async fn mock_delay(&self, request_path: &str, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(200).set_delay(delay))
            .mount(&self.server)
            .await;
    }
}

/// HTTPS server with a self-signed `localhost` certificate.
///
/// Every request gets `200 OK` with a two byte body and the connection is
/// kept open for the next one.
struct TlsTestServer {
    port: u16,
    certificate: CertificateDer<'static>,
}

impl TlsTestServer {
    async fn start() -> Self {
        let CertifiedKey { cert, key_pair } =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let certificate = cert.der().clone();
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

        let config = rustls::ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(vec![certificate.clone()], key)
            .unwrap();
        let acceptor = TlsAcceptor::from(Arc::new(config));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    if let Ok(stream) = acceptor.accept(tcp).await {
                        respond_ok(stream).await;
                    }
                });
            }
        });

        Self { port, certificate }
    }

    fn url(&self) -> Url {
        Url::parse(&format!("https://localhost:{}/", self.port)).unwrap()
    }

    /// Dialer trusting only this server's certificate
    fn dialer(&self) -> TlsDialer {
        let mut roots = rustls::RootCertStore::empty();
        roots.add(self.certificate.clone()).unwrap();
        TlsDialer::with_root_certificates(roots).unwrap()
    }
}

async fn respond_ok<S: AsyncRead + AsyncWrite + Unpin>(mut stream: S) {
    let mut pending = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => pending.extend_from_slice(&chunk[..n]),
        }
        while let Some(end) = pending.windows(4).position(|w| w == b"\r\n\r\n") {
            pending.drain(..end + 4);
            let response = b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nOK";
            if stream.write_all(response).await.is_err() || stream.flush().await.is_err() {
                return;
            }
        }
    }
}

fn client_for(url: &Url) -> TracedClient {
    TracedClient::new(&Config::for_target(url.as_str(), 1, 1)).unwrap()
}

#[tokio::test]
async fn test_successful_request_is_traced() {
    let server = MockHttpServer::new().await;
    server.mock_status("/health", 200, "OK").await;
    let url = server.url("/health");
    let client = client_for(&url);

    let mut trace = RequestTrace::new();
    let response = client.execute(&url, &mut trace).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body_bytes, 2);
    assert!(response.body_error.is_none());
    assert!(!trace.reused());

    let metrics = trace.into_metrics(response.status_code, false);
    // literal IP target: no resolution
    assert_eq!(metrics.dns_lookup_ms, 0.0);
    assert_eq!(metrics.tls_handshake_ms, 0.0);
    assert!(metrics.server_processing_ms >= 0.0);
    assert!(metrics.is_success());
}

#[tokio::test]
async fn test_server_processing_reflects_delay() {
    let server = MockHttpServer::new().await;
    server.mock_delay("/slow", Duration::from_millis(150)).await;
    let url = server.url("/slow");
    let client = client_for(&url);

    let mut trace = RequestTrace::new();
    let response = client.execute(&url, &mut trace).await.unwrap();
    let metrics = trace.into_metrics(response.status_code, false);

    assert!(metrics.server_processing_ms >= 140.0, "got {}", metrics.server_processing_ms);
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let server = MockHttpServer::new().await;
    server.mock_status("/broken", 500, "boom").await;
    let url = server.url("/broken");
    let client = client_for(&url);

    let mut trace = RequestTrace::new();
    let response = client.execute(&url, &mut trace).await.unwrap();
    assert_eq!(response.status_code, 500);
}

#[tokio::test]
async fn test_keep_alive_reuses_connection() {
    let server = MockHttpServer::new().await;
    server.mock_status("/", 200, "hello").await;
    let url = server.url("/");
    let client = client_for(&url);
    let key = PoolKey::from_url(&url).unwrap();

    let mut first = RequestTrace::new();
    client.execute(&url, &mut first).await.unwrap();
    assert!(!first.reused());
    assert_eq!(client.pool().idle_count(&key), 1);

    let mut second = RequestTrace::new();
    client.execute(&url, &mut second).await.unwrap();
    assert!(second.reused());

    let metrics = second.into_metrics(200, false);
    assert!(metrics.connection_reused);
    assert_eq!(metrics.tcp_connect_ms, 0.0);
}

#[tokio::test]
async fn test_disabled_keep_alive_dials_every_time() {
    let server = MockHttpServer::new().await;
    server.mock_status("/", 200, "hello").await;
    let url = server.url("/");

    let mut config = Config::for_target(url.as_str(), 1, 2);
    config.disable_keep_alive = true;
    let client = TracedClient::new(&config).unwrap();
    let key = PoolKey::from_url(&url).unwrap();

    for _ in 0..2 {
        let mut trace = RequestTrace::new();
        client.execute(&url, &mut trace).await.unwrap();
        assert!(!trace.reused());
    }
    assert_eq!(client.pool().idle_count(&key), 0);
}

#[tokio::test]
async fn test_timeout_becomes_timeout_error() {
    let server = MockHttpServer::new().await;
    server.mock_delay("/stall", Duration::from_secs(5)).await;
    let url = server.url("/stall");

    let mut config = Config::for_target(url.as_str(), 1, 1);
    config.timeout_seconds = 1;
    let client = TracedClient::new(&config).unwrap();

    let mut trace = RequestTrace::new();
    let result = client.execute(&url, &mut trace).await;
    assert!(matches!(result, Err(AppError::Timeout(_))));
}

#[tokio::test]
async fn test_refused_connection_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
    let client = client_for(&url);

    let mut trace = RequestTrace::new();
    let result = client.execute(&url, &mut trace).await;
    assert!(matches!(result, Err(AppError::Network(_))));
}

#[tokio::test]
async fn test_query_string_reaches_server() {
    let server = MockHttpServer::new().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(wiremock::matchers::query_param("page", "2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server.server)
        .await;

    let url = server.url("/items?page=2");
    let client = client_for(&url);

    let mut trace = RequestTrace::new();
    let response = client.execute(&url, &mut trace).await.unwrap();
    assert_eq!(response.status_code, 204);
}

#[tokio::test]
async fn test_hostname_target_is_resolved() {
    let server = MockHttpServer::new().await;
    server.mock_status("/", 200, "hi").await;
    let url = Url::parse(&format!("http://localhost:{}/", server.server.address().port())).unwrap();
    let client = client_for(&url);

    let mut trace = RequestTrace::new();
    let response = client.execute(&url, &mut trace).await.unwrap();
    assert_eq!(response.status_code, 200);

    let metrics = trace.into_metrics(response.status_code, false);
    assert!(metrics.dns_lookup_ms > 0.0, "got {}", metrics.dns_lookup_ms);
}

#[tokio::test]
async fn test_unresolvable_host_is_dns_error() {
    let url = Url::parse("http://does-not-exist.invalid/").unwrap();
    let client = client_for(&url).with_resolver(DnsResolver::fallback());

    let mut trace = RequestTrace::new();
    let result = client.execute(&url, &mut trace).await;
    assert!(matches!(result, Err(AppError::DnsResolution(_))));
}

#[tokio::test]
async fn test_https_request_traces_tls_handshake() {
    let server = TlsTestServer::start().await;
    let url = server.url();
    let client = client_for(&url).with_tls(server.dialer());

    let mut trace = RequestTrace::new();
    let response = client.execute(&url, &mut trace).await.unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body_bytes, 2);

    let first = trace.into_metrics(response.status_code, true);
    assert!(!first.connection_reused);
    assert!(first.tls_handshake_ms > 0.0, "got {}", first.tls_handshake_ms);
    assert!(first.is_success());

    // later requests ride the pooled TLS session
    for _ in 0..2 {
        let mut trace = RequestTrace::new();
        let response = client.execute(&url, &mut trace).await.unwrap();
        let metrics = trace.into_metrics(response.status_code, true);
        assert!(metrics.connection_reused);
        assert_eq!(metrics.tls_handshake_ms, 0.0);
        assert_eq!(metrics.tcp_connect_ms, 0.0);
    }
}

#[tokio::test]
async fn test_untrusted_certificate_is_tls_error() {
    let server = TlsTestServer::start().await;
    let url = server.url();
    // webpki roots do not include the self-signed certificate
    let client = client_for(&url);

    let mut trace = RequestTrace::new();
    let result = client.execute(&url, &mut trace).await;
    assert!(matches!(result, Err(AppError::Tls(_))));
}

#[tokio::test]
async fn test_https_load_test_reports_tls_row() {
    let server = TlsTestServer::start().await;
    let config = Config::for_target(server.url().as_str(), 2, 10);
    let client = TracedClient::new(&config).unwrap().with_tls(server.dialer());

    let outcome = LoadTest::with_executor(config, Arc::new(client)).run().await.unwrap();
    let stats = &outcome.stats;

    assert_eq!(stats.total_requests, 10);
    assert_eq!(stats.failed_requests, 0);
    assert_eq!(stats.status_codes.get(&200), Some(&10));

    let tls = stats.tls.as_ref().unwrap();
    assert!(tls.samples >= 1);
    assert!(tls.median.unwrap() > 0.0);
    assert!(stats.dns.samples >= 1);
}
