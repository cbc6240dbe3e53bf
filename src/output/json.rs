//! Machine-readable summary output

use super::formatter::SummaryFormatter;
use crate::{
    error::Result,
    models::{AggregateStats, Config},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Summary document written to stdout with `--json`
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    stats: &'a AggregateStats,
    successful_requests: usize,
    failure_rate_percent: f64,
}

/// Emits the aggregated statistics as a single JSON document.
///
/// Banners are suppressed so stdout stays parseable.
#[derive(Debug)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Single-line output
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryFormatter for JsonFormatter {
    fn format_run_start(&self, _config: &Config) -> Result<String> {
        Ok(String::new())
    }

    fn format_summary(&self, stats: &AggregateStats) -> Result<String> {
        let report = JsonReport {
            generated_at: Utc::now(),
            stats,
            successful_requests: stats.successful_requests(),
            failure_rate_percent: stats.failure_rate(),
        };

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        Ok(rendered)
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("Warning: {}", warning))
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("Error: {}", error))
    }
}
