//! HTTP Load Tester
//!
//! A concurrent HTTP load generator. It issues a configured number of GET
//! requests at a fixed concurrency level, traces the DNS, TCP, TLS, server
//! processing and content transfer phase of every request, and aggregates
//! the results into per-phase mean/median/p95 statistics.

pub mod app;
pub mod cli;
pub mod config;
pub mod client;
pub mod dns;
pub mod error;
pub mod logging;
pub mod stats;
pub mod executor;
pub mod output;
pub mod models;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, DurationMetrics, AggregateStats, PhaseStats, RequestFailure};
pub use executor::{LoadTest, LoadTestOutcome};
pub use stats::{StatisticsEngine, StatisticsConfig};
pub use output::{SummaryFormatter, ColoredFormatter, PlainFormatter, JsonFormatter, OutputFormatterFactory};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_CONCURRENCY: usize = 1;
    pub const DEFAULT_REQUESTS: usize = 1;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
    /// TCP connect samples at or above this value are dropped from TCP statistics
    pub const DEFAULT_TCP_OUTLIER_THRESHOLD_MS: f64 = 1000.0;
    pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 300;
    pub const DEFAULT_MAX_IDLE_PER_HOST: usize = 300;
    pub const DEFAULT_MAX_CONNECTIONS_PER_HOST: usize = 300;
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    pub const USER_AGENT: &str = concat!("http-load-tester/", env!("CARGO_PKG_VERSION"));
}
