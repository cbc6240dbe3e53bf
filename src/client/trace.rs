//! Per-request lifecycle timestamps and their conversion into phase durations

use crate::models::metrics::DurationMetrics;
use std::time::{Duration, Instant};

/// Timestamps captured while a single request moves through the client.
///
/// Every hook records `Instant::now()`. Any of them may be skipped: a literal
/// IP address never resolves, a pooled connection never dials, and a plain
/// HTTP target never handshakes. `into_metrics` substitutes the nearest
/// later timestamp for a missing one so skipped phases come out as zero.
#[derive(Debug, Clone)]
pub struct RequestTrace {
    started: Instant,
    dns_start: Option<Instant>,
    dns_done: Option<Instant>,
    connect_start: Option<Instant>,
    connect_done: Option<Instant>,
    tls_start: Option<Instant>,
    tls_done: Option<Instant>,
    got_conn: Option<Instant>,
    first_byte: Option<Instant>,
    body_done: Option<Instant>,
    reused: bool,
}

impl Default for RequestTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestTrace {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            dns_start: None,
            dns_done: None,
            connect_start: None,
            connect_done: None,
            tls_start: None,
            tls_done: None,
            got_conn: None,
            first_byte: None,
            body_done: None,
            reused: false,
        }
    }

    pub fn dns_start(&mut self) {
        self.dns_start = Some(Instant::now());
    }

    pub fn dns_done(&mut self) {
        self.dns_done = Some(Instant::now());
    }

    pub fn connect_start(&mut self) {
        let now = Instant::now();
        self.connect_start = Some(now);
        // Dialing a literal IP: the connect start stands in for DNS completion
        self.dns_done.get_or_insert(now);
    }

    pub fn connect_done(&mut self) {
        self.connect_done = Some(Instant::now());
    }

    pub fn tls_start(&mut self) {
        self.tls_start = Some(Instant::now());
    }

    pub fn tls_done(&mut self) {
        self.tls_done = Some(Instant::now());
    }

    /// A connection is ready to carry the request
    pub fn got_conn(&mut self, reused: bool) {
        self.got_conn = Some(Instant::now());
        self.reused = reused;
    }

    /// First response byte observed at `at`; later calls are ignored
    pub fn first_response_byte(&mut self, at: Instant) {
        self.first_byte.get_or_insert(at);
    }

    /// The response body has been read to the end (or abandoned)
    pub fn body_done(&mut self) {
        self.body_done = Some(Instant::now());
    }

    pub fn reused(&self) -> bool {
        self.reused
    }

    /// Time since the trace was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Derive phase durations for a request that produced a response
    pub fn into_metrics(self, status_code: u16, tls: bool) -> DurationMetrics {
        let conn = self.got_conn.unwrap_or(self.started);

        let (dns, tcp, handshake) = if self.reused {
            (Duration::ZERO, Duration::ZERO, Duration::ZERO)
        } else {
            let dns_done = self.dns_done.or(self.connect_start).unwrap_or(conn);
            let dns_start = self.dns_start.unwrap_or(dns_done);
            let handshake = match (tls, self.tls_start, self.tls_done) {
                (true, Some(start), Some(done)) => done.saturating_duration_since(start),
                _ => Duration::ZERO,
            };
            (
                dns_done.saturating_duration_since(dns_start),
                conn.saturating_duration_since(dns_done),
                handshake,
            )
        };

        let first_byte = self.first_byte.unwrap_or(conn);
        let body_done = self.body_done.unwrap_or(first_byte);

        DurationMetrics::completed(
            dns,
            tcp,
            handshake,
            first_byte.saturating_duration_since(conn),
            body_done.saturating_duration_since(first_byte),
            status_code,
        )
        .with_reused_connection(self.reused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, ms: u64) -> Option<Instant> {
        Some(base + Duration::from_millis(ms))
    }

    fn fresh_trace(base: Instant) -> RequestTrace {
        RequestTrace {
            started: base,
            dns_start: at(base, 0),
            dns_done: at(base, 5),
            connect_start: at(base, 5),
            connect_done: at(base, 15),
            tls_start: at(base, 15),
            tls_done: at(base, 45),
            got_conn: at(base, 45),
            first_byte: at(base, 95),
            body_done: at(base, 100),
            reused: false,
        }
    }

    #[test]
    fn test_full_https_sequence() {
        let metrics = fresh_trace(Instant::now()).into_metrics(200, true);

        assert_eq!(metrics.dns_lookup_ms, 5.0);
        // connect plus handshake, measured from DNS completion
        assert_eq!(metrics.tcp_connect_ms, 40.0);
        assert_eq!(metrics.tls_handshake_ms, 30.0);
        assert_eq!(metrics.server_processing_ms, 50.0);
        assert_eq!(metrics.content_transfer_ms, 5.0);
        assert_eq!(metrics.status_code, 200);
        assert!(!metrics.connection_reused);
    }

    #[test]
    fn test_tls_zero_for_plain_http() {
        let metrics = fresh_trace(Instant::now()).into_metrics(200, false);
        assert_eq!(metrics.tls_handshake_ms, 0.0);
    }

    #[test]
    fn test_skipped_dns_is_zero() {
        let base = Instant::now();
        let mut trace = fresh_trace(base);
        trace.dns_start = None;
        trace.dns_done = None;

        let metrics = trace.into_metrics(200, false);
        assert_eq!(metrics.dns_lookup_ms, 0.0);
        assert_eq!(metrics.tcp_connect_ms, 40.0);
    }

    #[test]
    fn test_reused_connection_collapses_dial_phases() {
        let base = Instant::now();
        let trace = RequestTrace {
            started: base,
            dns_start: None,
            dns_done: None,
            connect_start: None,
            connect_done: None,
            tls_start: None,
            tls_done: None,
            got_conn: at(base, 1),
            first_byte: at(base, 21),
            body_done: at(base, 24),
            reused: true,
        };

        let metrics = trace.into_metrics(204, true);
        assert_eq!(metrics.dns_lookup_ms, 0.0);
        assert_eq!(metrics.tcp_connect_ms, 0.0);
        assert_eq!(metrics.tls_handshake_ms, 0.0);
        assert_eq!(metrics.server_processing_ms, 20.0);
        assert_eq!(metrics.content_transfer_ms, 3.0);
        assert!(metrics.connection_reused);
    }

    #[test]
    fn test_first_response_byte_keeps_earliest() {
        let base = Instant::now();
        let mut trace = RequestTrace::new();
        trace.first_response_byte(base + Duration::from_millis(10));
        trace.first_response_byte(base + Duration::from_millis(30));
        assert_eq!(trace.first_byte, at(base, 10));
    }

    #[test]
    fn test_connect_start_backfills_dns_done() {
        let mut trace = RequestTrace::new();
        trace.connect_start();
        assert_eq!(trace.dns_done, trace.connect_start);

        let mut trace = RequestTrace::new();
        trace.dns_start();
        trace.dns_done();
        let resolved = trace.dns_done;
        trace.connect_start();
        assert_eq!(trace.dns_done, resolved);
    }

    #[test]
    fn test_missing_timestamps_never_panic() {
        let metrics = RequestTrace::new().into_metrics(200, true);
        assert_eq!(metrics.total_ms(), 0.0);
    }
}
