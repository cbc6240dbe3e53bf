//! Data models and structures for the HTTP load tester

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::{Config, PoolLimits};
pub use metrics::{AggregateStats, DurationMetrics, PhaseStats, RequestFailure};
