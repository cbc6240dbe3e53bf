//! Per-request duration records and aggregated run statistics

use crate::types::{AppError, FailureKind, RunMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Why a single request produced no usable timing data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl RequestFailure {
    pub fn new<S: Into<String>>(kind: FailureKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a client error into a per-request failure.
    ///
    /// The kind already names the category, so only the error's own message
    /// is kept; unclassified errors keep their full description.
    pub fn from_error(error: &AppError) -> Self {
        let kind = match error {
            AppError::DnsResolution(_) => FailureKind::Dns,
            AppError::Network(_) => FailureKind::Connect,
            AppError::Tls(_) => FailureKind::Tls,
            AppError::Timeout(_) => FailureKind::Timeout,
            AppError::HttpRequest(_) => FailureKind::Http,
            _ => return Self::new(FailureKind::Request, error.to_string()),
        };
        Self::new(kind, error.detail())
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Phase durations of one request, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationMetrics {
    pub dns_lookup_ms: f64,
    pub tcp_connect_ms: f64,
    /// Zero unless the request went over TLS
    pub tls_handshake_ms: f64,
    pub server_processing_ms: f64,
    pub content_transfer_ms: f64,
    /// HTTP status, or 0 when no response was received
    pub status_code: u16,
    /// Request was sent over a pooled connection; no dial took place
    #[serde(default)]
    pub connection_reused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<RequestFailure>,
}

impl DurationMetrics {
    /// Record for a request that received a response
    pub fn completed(
        dns: Duration,
        tcp: Duration,
        tls: Duration,
        server: Duration,
        transfer: Duration,
        status_code: u16,
    ) -> Self {
        Self {
            dns_lookup_ms: as_millis(dns),
            tcp_connect_ms: as_millis(tcp),
            tls_handshake_ms: as_millis(tls),
            server_processing_ms: as_millis(server),
            content_transfer_ms: as_millis(transfer),
            status_code,
            connection_reused: false,
            failure: None,
        }
    }

    /// Mark the record as sent over a pooled connection
    pub fn with_reused_connection(mut self, reused: bool) -> Self {
        self.connection_reused = reused;
        self
    }

    /// Record for a request that never produced a status code
    pub fn failed(failure: RequestFailure) -> Self {
        Self {
            dns_lookup_ms: 0.0,
            tcp_connect_ms: 0.0,
            tls_handshake_ms: 0.0,
            server_processing_ms: 0.0,
            content_transfer_ms: 0.0,
            status_code: 0,
            connection_reused: false,
            failure: Some(failure),
        }
    }

    /// 2xx response
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// No response at all; timing fields carry no data
    pub fn is_transport_failure(&self) -> bool {
        self.failure.is_some()
    }

    /// Sum of all phases
    pub fn total_ms(&self) -> f64 {
        self.dns_lookup_ms
            + self.tcp_connect_ms
            + self.tls_handshake_ms
            + self.server_processing_ms
            + self.content_transfer_ms
    }
}

fn as_millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// Summary statistics for one latency phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseStats {
    /// Number of values the statistics were computed from
    pub samples: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub p95: Option<f64>,
}

impl PhaseStats {
    /// Statistics for a phase with no data
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_data(&self) -> bool {
        self.samples > 0
    }

    /// Render a statistic for display, `N/A` when absent
    pub fn format_value(value: Option<f64>) -> String {
        match value {
            Some(v) => format!("{:.2}ms", v),
            None => "N/A".to_string(),
        }
    }
}

/// Aggregated result of a complete load test run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateStats {
    pub target: String,
    pub mode: RunMode,
    pub concurrency: usize,
    pub dns: PhaseStats,
    pub tcp: PhaseStats,
    /// Present only when the target is served over TLS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<PhaseStats>,
    pub server_processing: PhaseStats,
    pub content_transfer: PhaseStats,
    pub total_requests: usize,
    /// Records whose status is outside 200..=299, transport failures included
    pub failed_requests: usize,
    pub elapsed_ms: f64,
    pub requests_per_second: f64,
    /// Response count per HTTP status (transport failures excluded)
    #[serde(default)]
    pub status_codes: BTreeMap<u16, usize>,
    /// Transport failure count per kind
    #[serde(default)]
    pub failures_by_kind: BTreeMap<FailureKind, usize>,
}

impl AggregateStats {
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.elapsed_ms.max(0.0) / 1000.0)
    }

    pub fn successful_requests(&self) -> usize {
        self.total_requests.saturating_sub(self.failed_requests)
    }

    /// Failure percentage (0.0-100.0)
    pub fn failure_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.failed_requests as f64 / self.total_requests as f64 * 100.0
        }
    }

    pub fn has_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// Phase rows in display order, TLS included only when present
    pub fn phases(&self) -> Vec<(&'static str, &PhaseStats)> {
        let mut rows = vec![("DNS Lookup", &self.dns), ("TCP Connect", &self.tcp)];
        if let Some(tls) = &self.tls {
            rows.push(("TLS Handshake", tls));
        }
        rows.push(("Server Processing", &self.server_processing));
        rows.push(("Content Transfer", &self.content_transfer));
        rows
    }
}
