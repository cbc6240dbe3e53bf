//! Property-based tests for the aggregation pipeline

use super::{mean, median, percentile_rank, phase_stats, throughput, StatisticsConfig, StatisticsEngine};
use crate::models::metrics::{DurationMetrics, RequestFailure};
use crate::types::FailureKind;
use proptest::collection::vec;
use proptest::prelude::*;
use std::time::Duration;

mod generators {
    use super::*;

    pub fn latencies() -> impl Strategy<Value = Vec<f64>> {
        vec(0.001f64..100_000.0, 1..500)
    }

    /// A record that either responded with some status or failed in transport
    pub fn duration_record() -> impl Strategy<Value = DurationMetrics> {
        prop_oneof![
            4 => (0.0f64..50.0, 0.0f64..2000.0, 0.0f64..80.0, 0.0f64..500.0, 0.0f64..50.0, 100u16..600, any::<bool>())
                .prop_map(|(dns, tcp, tls, server, transfer, status, reused)| DurationMetrics {
                    dns_lookup_ms: dns,
                    tcp_connect_ms: tcp,
                    tls_handshake_ms: tls,
                    server_processing_ms: server,
                    content_transfer_ms: transfer,
                    status_code: status,
                    connection_reused: reused,
                    failure: None,
                }),
            1 => Just(DurationMetrics::failed(RequestFailure::new(FailureKind::Timeout, "timed out"))),
        ]
    }
}

mod property_tests {
    use super::*;

    proptest! {
        /// Mean, median and p95 all lie within the sample range
        #[test]
        fn statistics_within_bounds(values in generators::latencies()) {
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let stats = phase_stats(values);

            for value in [stats.mean, stats.median, stats.p95] {
                let value = value.unwrap();
                let tolerance = max * 1e-9;
                prop_assert!(value >= min - tolerance && value <= max + tolerance);
            }
        }

        /// p95 is an actual sample value and never below the median
        #[test]
        fn p95_is_a_sample_not_below_median(values in generators::latencies()) {
            let mut sorted = values.clone();
            sorted.sort_by(|a, b| a.total_cmp(b));
            let p95 = percentile_rank(&sorted, 95).unwrap();
            let mid = median(&sorted).unwrap();

            prop_assert!(sorted.contains(&p95));
            prop_assert!(p95 >= mid);
        }

        /// Input order does not change the result
        #[test]
        fn order_independent(values in generators::latencies()) {
            let mut reversed = values.clone();
            reversed.reverse();
            prop_assert_eq!(phase_stats(values), phase_stats(reversed));
        }

        /// Constant samples have identical mean, median and p95
        #[test]
        fn constant_sample(value in 0.001f64..10_000.0, n in 1usize..200) {
            let stats = phase_stats(vec![value; n]);
            prop_assert_eq!(stats.median, Some(value));
            prop_assert_eq!(stats.p95, Some(value));
            prop_assert!((stats.mean.unwrap() - value).abs() < 1e-6 * value.max(1.0));
        }

        /// Every record is counted once and failures are exactly the non-2xx records
        #[test]
        fn every_record_accounted_for(records in vec(generators::duration_record(), 0..300)) {
            let expected_failures = records.iter().filter(|r| !(200..300).contains(&r.status_code)).count();
            let responded = records.iter().filter(|r| r.failure.is_none()).count();
            let dialed = records.iter().filter(|r| r.failure.is_none() && !r.connection_reused).count();

            let mut engine = StatisticsEngine::new(StatisticsConfig { tls: true, ..StatisticsConfig::default() });
            engine.add_records(records.clone());
            let stats = engine.aggregate(Duration::from_secs(1));

            prop_assert_eq!(stats.total_requests, records.len());
            prop_assert_eq!(stats.failed_requests, expected_failures);
            prop_assert_eq!(stats.server_processing.samples, responded);
            prop_assert_eq!(stats.tls.map(|t| t.samples), Some(dialed));
            prop_assert_eq!(stats.status_codes.values().sum::<usize>(), responded);
            prop_assert!(stats.tcp.samples <= responded);
            prop_assert!(stats.dns.samples <= responded);
        }

        /// Throughput equals request count divided by elapsed seconds
        #[test]
        fn throughput_matches_elapsed(n in 1usize..10_000, millis in 1u64..600_000) {
            let stats = StatisticsEngine::with_defaults().aggregate(Duration::from_millis(millis));
            prop_assert_eq!(stats.requests_per_second, 0.0);

            let expected = n as f64 / (millis as f64 / 1000.0);
            let actual = throughput(n, Duration::from_millis(millis));
            prop_assert!((actual - expected).abs() <= expected * 1e-9);
        }
    }
}

#[test]
fn mean_of_empty_is_none() {
    assert_eq!(mean(&[]), None);
    assert_eq!(median(&[]), None);
}
