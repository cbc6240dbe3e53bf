//! Statistical aggregation of per-request duration records

use crate::{
    models::{
        config::Config,
        metrics::{AggregateStats, DurationMetrics, PhaseStats},
    },
    types::RunMode,
};
use std::collections::BTreeMap;
use std::time::Duration;

/// Aggregation policy and labels for one run
#[derive(Debug, Clone)]
pub struct StatisticsConfig {
    /// Target URL, reported as-is
    pub target: String,
    pub mode: RunMode,
    pub concurrency: usize,
    /// Whether TLS handshake statistics are reported
    pub tls: bool,
    /// TCP connect samples at or above this value are excluded; `None` keeps all
    pub tcp_outlier_threshold_ms: Option<f64>,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            mode: RunMode::Count,
            concurrency: crate::defaults::DEFAULT_CONCURRENCY,
            tls: false,
            tcp_outlier_threshold_ms: Some(crate::defaults::DEFAULT_TCP_OUTLIER_THRESHOLD_MS),
        }
    }
}

impl StatisticsConfig {
    /// Derive the aggregation policy from a run configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            target: config.base_url.clone(),
            mode: config.mode(),
            concurrency: config.concurrency,
            tls: config.is_tls(),
            tcp_outlier_threshold_ms: config.tcp_outlier_threshold_ms,
        }
    }
}

/// Collects duration records and reduces them to an `AggregateStats`
pub struct StatisticsEngine {
    records: Vec<DurationMetrics>,
    config: StatisticsConfig,
}

impl StatisticsEngine {
    /// Create a new statistics engine
    pub fn new(config: StatisticsConfig) -> Self {
        Self {
            records: Vec::new(),
            config,
        }
    }

    /// Create a statistics engine with default configuration
    pub fn with_defaults() -> Self {
        Self::new(StatisticsConfig::default())
    }

    /// Create an engine with capacity for the expected number of records
    pub fn with_capacity(config: StatisticsConfig, capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            config,
        }
    }

    pub fn add_record(&mut self, record: DurationMetrics) {
        self.records.push(record);
    }

    pub fn add_records<I: IntoIterator<Item = DurationMetrics>>(&mut self, records: I) {
        self.records.extend(records);
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Consume the engine, returning the raw records
    pub fn into_records(self) -> Vec<DurationMetrics> {
        self.records
    }

    /// Reduce every collected record into run statistics
    pub fn aggregate(&self, elapsed: Duration) -> AggregateStats {
        let responded: Vec<&DurationMetrics> = self
            .records
            .iter()
            .filter(|r| !r.is_transport_failure())
            .collect();

        let dns: Vec<f64> = responded
            .iter()
            .map(|r| r.dns_lookup_ms)
            .filter(|&v| v != 0.0)
            .collect();

        let tcp: Vec<f64> = responded
            .iter()
            .filter(|r| !r.connection_reused)
            .map(|r| r.tcp_connect_ms)
            .filter(|&v| self.within_tcp_threshold(v))
            .collect();

        // Reused connections skip the handshake just as they skip the dial
        let tls = self.config.tls.then(|| {
            phase_stats(
                responded
                    .iter()
                    .filter(|r| !r.connection_reused)
                    .map(|r| r.tls_handshake_ms)
                    .collect(),
            )
        });

        let server: Vec<f64> = responded.iter().map(|r| r.server_processing_ms).collect();
        let transfer: Vec<f64> = responded.iter().map(|r| r.content_transfer_ms).collect();

        let mut status_codes = BTreeMap::new();
        for record in &responded {
            *status_codes.entry(record.status_code).or_insert(0) += 1;
        }

        let mut failures_by_kind = BTreeMap::new();
        for failure in self.records.iter().filter_map(|r| r.failure.as_ref()) {
            *failures_by_kind.entry(failure.kind).or_insert(0) += 1;
        }

        let total_requests = self.records.len();
        let failed_requests = self.records.iter().filter(|r| !r.is_success()).count();

        AggregateStats {
            target: self.config.target.clone(),
            mode: self.config.mode,
            concurrency: self.config.concurrency,
            dns: phase_stats(dns),
            tcp: phase_stats(tcp),
            tls,
            server_processing: phase_stats(server),
            content_transfer: phase_stats(transfer),
            total_requests,
            failed_requests,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            requests_per_second: throughput(total_requests, elapsed),
            status_codes,
            failures_by_kind,
        }
    }

    fn within_tcp_threshold(&self, value: f64) -> bool {
        match self.config.tcp_outlier_threshold_ms {
            Some(threshold) => value < threshold,
            None => true,
        }
    }
}

/// Compute mean, median and p95 of a sample
pub fn phase_stats(mut values: Vec<f64>) -> PhaseStats {
    values.sort_by(|a, b| a.total_cmp(b));
    PhaseStats {
        samples: values.len(),
        mean: mean(&values),
        median: median(&values),
        p95: percentile_rank(&values, 95),
    }
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of an ascending slice; the two middle values are averaged for even lengths
pub fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// Nearest-rank percentile of an ascending slice: the value at 1-based rank ceil(p/100 * n)
pub fn percentile_rank(sorted: &[f64], percentile: u32) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let percentile = percentile.min(100) as usize;
    let rank = (percentile * n).div_ceil(100).max(1);
    Some(sorted[rank - 1])
}

/// Requests per second over the wall-clock duration of the run
pub fn throughput(total_requests: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        total_requests as f64 / secs
    } else {
        0.0
    }
}


// Property-based tests in separate module
#[cfg(test)]
mod comprehensive_tests;
