//! Phase-traced HTTP client
//!
//! Requests go over hand-managed HTTP/1.1 connections so that every phase of
//! a request (resolution, dial, handshake, first byte, body) can be observed
//! and stamped into a `RequestTrace`.

pub mod pool;
pub mod stream;
pub mod tls;
pub mod trace;

#[cfg(test)]
mod integration_tests;

pub use pool::{ConnectionPool, PoolKey};
pub use tls::TlsDialer;
pub use trace::RequestTrace;

use crate::{
    dns::{literal_ip, DnsResolver},
    error::{AppError, Result},
    models::Config,
};
use async_trait::async_trait;
use bytes::Bytes;
use http::{header, Method, Request};
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use pool::{Checkout, PooledConnection};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};
use stream::{ReadMarker, TargetStream, TracedIo};
use tokio::net::TcpStream;
use url::Url;

/// What a request produced once its body was drained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracedResponse {
    pub status_code: u16,
    pub body_bytes: u64,
    /// Set when the body could not be read to the end; the status still counts
    pub body_error: Option<String>,
}

impl TracedResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            body_bytes: 0,
            body_error: None,
        }
    }
}

/// Executes one GET request, stamping lifecycle events into the trace
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, url: &Url, trace: &mut RequestTrace) -> Result<TracedResponse>;
}

/// HTTP client that records DNS, connect, TLS, first-byte and body timings
pub struct TracedClient {
    resolver: DnsResolver,
    tls: TlsDialer,
    pool: ConnectionPool,
    timeout: Duration,
    keep_alive: bool,
}

impl TracedClient {
    /// Create a client using the timeout and pool settings of `config`
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            resolver: DnsResolver::from_system(),
            tls: TlsDialer::new()?,
            pool: ConnectionPool::new(config.pool, !config.disable_keep_alive),
            timeout: config.timeout(),
            keep_alive: !config.disable_keep_alive,
        })
    }

    /// Replace the resolver
    pub fn with_resolver(mut self, resolver: DnsResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the TLS dialer, e.g. to trust a private certificate authority
    pub fn with_tls(mut self, tls: TlsDialer) -> Self {
        self.tls = tls;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    async fn exchange(&self, url: &Url, trace: &mut RequestTrace) -> Result<TracedResponse> {
        let key = PoolKey::from_url(url)?;
        if key.scheme != "http" && key.scheme != "https" {
            return Err(AppError::validation(format!("Unsupported URL scheme: {}", key.scheme)));
        }

        // A pooled connection may have been closed by the server while idle;
        // such a request is retried once on a fresh connection.
        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut conn = self.connection(&key, trace).await?;
            let request = self.build_request(url, &key)?;

            conn.marker.arm();
            let response = match conn.sender.send_request(request).await {
                Ok(response) => response,
                Err(e) if trace.reused() && attempts < 2 && is_stale_connection(&e) => continue,
                Err(e) => return Err(AppError::http_request(format!("Request to {} failed: {}", url, e))),
            };
            let headers_at = Instant::now();
            trace.first_response_byte(conn.marker.take().unwrap_or(headers_at));

            let status_code = response.status().as_u16();
            let (body_bytes, body_error) = drain_body(response.into_body()).await;
            trace.body_done();

            if body_error.is_none() {
                self.pool.checkin(&key, conn);
            }

            return Ok(TracedResponse {
                status_code,
                body_bytes,
                body_error,
            });
        }
    }

    /// Obtain a ready connection, reusing an idle one when possible
    async fn connection(&self, key: &PoolKey, trace: &mut RequestTrace) -> Result<PooledConnection> {
        loop {
            match self.pool.checkout(key).await? {
                Checkout::Reused(mut conn) => {
                    if conn.sender.ready().await.is_ok() {
                        trace.got_conn(true);
                        return Ok(conn);
                    }
                }
                Checkout::Dial(permit) => {
                    let (sender, marker) = self.dial(key, trace).await?;
                    trace.got_conn(false);
                    return Ok(PooledConnection::new(sender, marker, permit));
                }
            }
        }
    }

    async fn dial(
        &self,
        key: &PoolKey,
        trace: &mut RequestTrace,
    ) -> Result<(http1::SendRequest<Empty<Bytes>>, Arc<ReadMarker>)> {
        let addresses = match literal_ip(&key.host) {
            Some(ip) => vec![ip],
            None => {
                trace.dns_start();
                let ips = self.resolver.resolve(&key.host).await?;
                trace.dns_done();
                ips
            }
        };

        trace.connect_start();
        let tcp = connect_any(&addresses, key).await?;
        trace.connect_done();
        tcp.set_nodelay(true).ok();

        let stream = if key.is_tls() {
            trace.tls_start();
            let tls = self.tls.handshake(&key.host, tcp).await?;
            trace.tls_done();
            TargetStream::Tls(Box::new(tls))
        } else {
            TargetStream::Plain(tcp)
        };

        let marker = Arc::new(ReadMarker::new());
        let io = TokioIo::new(TracedIo::new(stream, marker.clone()));
        let (sender, connection) = http1::handshake(io)
            .await
            .map_err(|e| AppError::http_request(format!("HTTP handshake with {} failed: {}", key.authority(), e)))?;

        tokio::spawn(async move {
            // Connection errors surface through the sender
            let _ = connection.await;
        });

        Ok((sender, marker))
    }

    fn build_request(&self, url: &Url, key: &PoolKey) -> Result<Request<Empty<Bytes>>> {
        let path_and_query = &url[url::Position::BeforePath..url::Position::AfterQuery];
        let path_and_query = if path_and_query.is_empty() { "/" } else { path_and_query };

        let mut builder = Request::builder()
            .method(Method::GET)
            .uri(path_and_query)
            .header(header::HOST, key.authority())
            .header(header::USER_AGENT, crate::defaults::USER_AGENT)
            .header(header::ACCEPT, "*/*");

        if !self.keep_alive {
            builder = builder.header(header::CONNECTION, "close");
        }

        Ok(builder.body(Empty::<Bytes>::new())?)
    }
}

#[async_trait]
impl RequestExecutor for TracedClient {
    async fn execute(&self, url: &Url, trace: &mut RequestTrace) -> Result<TracedResponse> {
        match tokio::time::timeout(self.timeout, self.exchange(url, trace)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::timeout(format!(
                "Request to {} exceeded {}s",
                url,
                self.timeout.as_secs()
            ))),
        }
    }
}

/// Connect to the first address that accepts
async fn connect_any(addresses: &[IpAddr], key: &PoolKey) -> Result<TcpStream> {
    let mut last_error = None;
    for ip in addresses {
        match TcpStream::connect(SocketAddr::new(*ip, key.port)).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }

    Err(AppError::network(match last_error {
        Some(e) => format!("Failed to connect to {}: {}", key.authority(), e),
        None => format!("No addresses to connect to for {}", key.host),
    }))
}

/// Read and discard the body, returning the byte count and any read error
async fn drain_body(mut body: Incoming) -> (u64, Option<String>) {
    let mut bytes = 0u64;
    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => {
                if let Some(data) = frame.data_ref() {
                    bytes += data.len() as u64;
                }
            }
            Err(e) => return (bytes, Some(e.to_string())),
        }
    }
    (bytes, None)
}

fn is_stale_connection(error: &hyper::Error) -> bool {
    error.is_canceled() || error.is_closed() || error.is_incomplete_message()
}
