//! Keep-alive connection pool with a per-host connection cap

use crate::{
    client::stream::ReadMarker,
    error::{AppError, Result},
    models::config::PoolLimits,
};
use bytes::Bytes;
use http_body_util::Empty;
use hyper::client::conn::http1::SendRequest;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};

/// Identifies the origin a connection is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl PoolKey {
    pub fn from_url(url: &url::Url) -> Result<Self> {
        let host = url
            .host_str()
            .ok_or_else(|| AppError::validation(format!("URL has no host: {}", url)))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| AppError::validation(format!("URL has no port: {}", url)))?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host.to_string(),
            port,
        })
    }

    pub fn is_tls(&self) -> bool {
        self.scheme == "https"
    }

    /// `host:port` as used in the Host header, default port omitted
    pub fn authority(&self) -> String {
        let default_port = if self.is_tls() { 443 } else { 80 };
        if self.port == default_port {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// An established HTTP/1.1 connection together with its slot under the host cap
pub struct PooledConnection {
    pub sender: SendRequest<Empty<Bytes>>,
    pub marker: Arc<ReadMarker>,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    pub fn new(sender: SendRequest<Empty<Bytes>>, marker: Arc<ReadMarker>, permit: OwnedSemaphorePermit) -> Self {
        Self {
            sender,
            marker,
            _permit: permit,
        }
    }

    /// The peer has not closed the connection
    pub fn is_reusable(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Result of asking the pool for a connection
pub enum Checkout {
    /// An idle keep-alive connection
    Reused(PooledConnection),
    /// Permission to dial a new connection
    Dial(OwnedSemaphorePermit),
}

struct HostSlot {
    idle: Vec<PooledConnection>,
    permits: Arc<Semaphore>,
    returned: Arc<Notify>,
}

/// Shared pool of HTTP/1.1 connections.
///
/// Live connections per host are capped by a semaphore. Each connection owns
/// its permit for its whole lifetime, idle or not, so a waiter is woken either
/// when a connection is returned (and can be reused) or when one is dropped.
pub struct ConnectionPool {
    limits: PoolLimits,
    keep_alive: bool,
    hosts: Mutex<HashMap<PoolKey, HostSlot>>,
}

impl ConnectionPool {
    pub fn new(limits: PoolLimits, keep_alive: bool) -> Self {
        Self {
            limits,
            keep_alive,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PoolKey, HostSlot>> {
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for either a reusable idle connection or a free dial slot
    pub async fn checkout(&self, key: &PoolKey) -> Result<Checkout> {
        loop {
            let (permits, returned) = {
                let mut hosts = self.lock();
                let slot = hosts.entry(key.clone()).or_insert_with(|| HostSlot {
                    idle: Vec::new(),
                    permits: Arc::new(Semaphore::new(self.limits.max_per_host)),
                    returned: Arc::new(Notify::new()),
                });

                while let Some(conn) = slot.idle.pop() {
                    if conn.is_reusable() {
                        return Ok(Checkout::Reused(conn));
                    }
                }

                (slot.permits.clone(), slot.returned.clone())
            };

            tokio::select! {
                permit = permits.acquire_owned() => {
                    let permit = permit.map_err(|_| AppError::internal("connection pool closed"))?;
                    return Ok(Checkout::Dial(permit));
                }
                _ = returned.notified() => continue,
            }
        }
    }

    /// Return a connection after its response has been fully read
    pub fn checkin(&self, key: &PoolKey, conn: PooledConnection) {
        if !self.keep_alive || !conn.is_reusable() {
            return;
        }

        let mut hosts = self.lock();
        let total_idle: usize = hosts.values().map(|slot| slot.idle.len()).sum();
        if total_idle >= self.limits.max_idle {
            return;
        }

        if let Some(slot) = hosts.get_mut(key) {
            if slot.idle.len() < self.limits.max_idle_per_host {
                slot.idle.push(conn);
                slot.returned.notify_one();
            }
        }
    }

    /// Idle connections currently held for a host
    pub fn idle_count(&self, key: &PoolKey) -> usize {
        self.lock().get(key).map_or(0, |slot| slot.idle.len())
    }

    /// Dial slots still free for a host
    pub fn available_permits(&self, key: &PoolKey) -> usize {
        self.lock()
            .get(key)
            .map_or(self.limits.max_per_host, |slot| slot.permits.available_permits())
    }
}
