//! Hostname resolution for new connections

use crate::error::{AppError, Result};
use std::net::IpAddr;
use trust_dns_resolver::{
    config::{ResolverConfig, ResolverOpts},
    system_conf,
    TokioAsyncResolver,
};

/// Resolves target hostnames before each dial
#[derive(Clone)]
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
    source: ResolverSource,
}

/// Where the resolver configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverSource {
    /// The operating system's resolver configuration
    System,
    /// Built-in defaults, used when the system configuration cannot be read
    Fallback,
}

impl DnsResolver {
    /// Create a resolver from the system configuration, falling back to defaults
    pub fn from_system() -> Self {
        match system_conf::read_system_conf() {
            Ok((config, opts)) => Self {
                resolver: TokioAsyncResolver::tokio(config, opts),
                source: ResolverSource::System,
            },
            Err(_) => Self::fallback(),
        }
    }

    /// Create a resolver using the library's default upstream servers
    pub fn fallback() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
            source: ResolverSource::Fallback,
        }
    }

    pub fn source(&self) -> ResolverSource {
        self.source
    }

    /// Resolve a hostname to its addresses
    pub async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        let response = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| AppError::dns_resolution(format!("DNS lookup failed for {}: {}", host, e)))?;

        let ips: Vec<IpAddr> = response.iter().collect();
        if ips.is_empty() {
            return Err(AppError::dns_resolution(format!("No addresses found for {}", host)));
        }
        Ok(ips)
    }
}

/// Parse a URL host as a literal IP address; such hosts skip resolution
pub fn literal_ip(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .ok()
}
