//! Type definitions and aliases

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// A single unit of work pulled from the work queue by a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkToken {
    /// Plain load test: request the base URL
    Repeat,
    /// File mode: request the base URL with this suffix appended
    Suffix(String),
}

impl WorkToken {
    /// Build the concrete request URL for this token
    pub fn target_url(&self, base: &url::Url) -> Result<url::Url> {
        match self {
            WorkToken::Repeat => Ok(base.clone()),
            WorkToken::Suffix(suffix) => {
                let joined = format!("{}{}", base.as_str().trim_end_matches('/'), normalize_suffix(suffix));
                url::Url::parse(&joined).map_err(AppError::from)
            }
        }
    }
}

fn normalize_suffix(suffix: &str) -> String {
    if suffix.is_empty() || suffix.starts_with('/') || suffix.starts_with('?') {
        suffix.to_string()
    } else {
        format!("/{}", suffix)
    }
}

/// How the set of requests for a run is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Fixed number of identical requests
    Count,
    /// One request per URL suffix read from a file
    File,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Count => "count",
            RunMode::File => "file",
        }
    }
}

/// Why a single request failed before producing an HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Request URL could not be built or is unsupported
    Request,
    /// Hostname could not be resolved
    Dns,
    /// TCP connection could not be established
    Connect,
    /// TLS handshake failed
    Tls,
    /// Request exceeded the client timeout
    Timeout,
    /// HTTP protocol error while sending or reading headers
    Http,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Request => "request",
            FailureKind::Dns => "dns",
            FailureKind::Connect => "connect",
            FailureKind::Tls => "tls",
            FailureKind::Timeout => "timeout",
            FailureKind::Http => "http",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
