//! Performance benchmarks for the HTTP load tester
//!
//! Aggregation runs once per load test over every record, so its cost
//! grows with the request count. These benchmarks track that cost along
//! with configuration parsing and summary rendering.

use clap::Parser;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use http_load_tester::{
    cli::Cli,
    config::ConfigParser,
    models::{DurationMetrics, RequestFailure},
    output::{FormattingOptions, JsonFormatter, PlainFormatter, SummaryFormatter},
    stats::{phase_stats, StatisticsConfig, StatisticsEngine},
    types::FailureKind,
};
use std::hint::black_box;
use std::time::Duration;

/// Records with a spread of phase timings, every 20th one a transport failure
fn create_sample_records(count: usize) -> Vec<DurationMetrics> {
    (0..count)
        .map(|i| {
            if i % 20 == 0 {
                return DurationMetrics::failed(RequestFailure::new(FailureKind::Timeout, "timed out"));
            }
            let i = i as u64;
            DurationMetrics::completed(
                Duration::from_micros(if i % 4 == 0 { 800 + i % 300 } else { 0 }),
                Duration::from_micros(1_000 + i % 2_000),
                Duration::from_micros(3_000 + i % 5_000),
                Duration::from_micros(10_000 + (i * 37) % 90_000),
                Duration::from_micros(200 + i % 700),
                if i % 50 == 0 { 503 } else { 200 },
            )
            .with_reused_connection(i % 3 != 0)
        })
        .collect()
}

fn statistics_config() -> StatisticsConfig {
    StatisticsConfig {
        target: "https://bench.test/".to_string(),
        tls: true,
        ..StatisticsConfig::default()
    }
}

/// Benchmark aggregation at increasing run sizes
fn benchmark_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    for size in [100usize, 10_000, 100_000].iter() {
        let records = create_sample_records(*size);

        group.bench_with_input(BenchmarkId::new("aggregate", size), size, |b, _| {
            let mut engine = StatisticsEngine::with_capacity(statistics_config(), records.len());
            engine.add_records(records.iter().cloned());
            b.iter(|| black_box(engine.aggregate(Duration::from_secs(10))))
        });

        let values: Vec<f64> = records.iter().map(|r| r.server_processing_ms).collect();
        group.bench_with_input(BenchmarkId::new("phase_stats", size), size, |b, _| {
            b.iter(|| black_box(phase_stats(values.clone())))
        });
    }

    group.finish();
}

/// Benchmark configuration parsing from CLI arguments
fn benchmark_config_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_parsing");

    group.bench_function("parse_cli_args", |b| {
        b.iter(|| {
            black_box(Cli::parse_from([
                "hlt", "-u", "https://bench.test/api", "-c", "50", "-n", "10000", "--timeout", "10",
            ]))
        })
    });

    group.bench_function("build_config", |b| {
        let cli = Cli::parse_from(["hlt", "-u", "https://bench.test/api", "-c", "50", "-n", "10000"]);
        let parser = ConfigParser::new(cli);
        b.iter(|| black_box(parser.parse_with(|_| None)))
    });

    group.finish();
}

/// Benchmark summary rendering
fn benchmark_summary_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("summary_rendering");

    let mut engine = StatisticsEngine::new(statistics_config());
    engine.add_records(create_sample_records(1_000));
    let stats = engine.aggregate(Duration::from_secs(2));

    let plain = PlainFormatter::new(FormattingOptions {
        enable_color: false,
        verbose_mode: true,
        table_borders: true,
    });
    group.bench_function("plain_table", |b| b.iter(|| black_box(plain.format_summary(&stats))));

    let json = JsonFormatter::new();
    group.bench_function("json", |b| b.iter(|| black_box(json.format_summary(&stats))));

    group.finish();
}

criterion_group!(
    benches,
    benchmark_aggregation,
    benchmark_config_parsing,
    benchmark_summary_rendering
);
criterion_main!(benches);
