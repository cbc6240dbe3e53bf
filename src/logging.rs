//! Structured logging for load test runs
//!
//! This module provides:
//! - Leveled, structured log entries with arbitrary JSON fields
//! - Console, JSON and compact output formats
//! - A session ID shared by every entry of one run
//! - `RunLogger`, which records run lifecycle and per-request problems
//!
//! All entries go to stderr so that the summary on stdout stays parseable.
//! When a progress bar is attached, entries are written while the bar is
//! suspended so they do not interleave with its redraws.

use crate::error::{AppError, Result};
use crate::models::{AggregateStats, Config, DurationMetrics, RequestFailure};
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - most detailed
    Trace = 0,
    /// Debug level - detailed information for debugging
    Debug = 1,
    /// Info level - general run information
    Info = 2,
    /// Warning level - a request failed but the run continues
    Warn = 3,
    /// Error level - error events
    Error = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }

    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }

    /// Minimum level implied by the verbosity flags of a configuration
    pub fn for_config(config: &Config) -> Self {
        if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    pub correlation_id: Option<String>,
    pub fields: HashMap<String, serde_json::Value>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// One JSON object per line
    Json,
    /// Compact single-line format
    Compact,
}

#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
    context_fields: HashMap<String, serde_json::Value>,
}

/// Leveled logger writing formatted entries to stderr
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
    progress_bar: Option<ProgressBar>,
}

impl Logger {
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
            progress_bar: None,
        }
    }

    /// Create a logger whose level and format follow the run configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        Self {
            min_level: LogLevel::for_config(config),
            use_color: config.enable_color,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
            progress_bar: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LogLevel {
        self.min_level
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    /// Hide `bar` while entries are written
    pub fn set_progress_bar(&mut self, bar: ProgressBar) {
        self.progress_bar = Some(bar);
    }

    pub fn progress_bar(&self) -> Option<&ProgressBar> {
        self.progress_bar.as_ref()
    }

    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Add a field to every subsequent entry
    pub async fn add_context_field<T: Serialize>(&self, key: String, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            let mut context = self.context.write().await;
            context.context_fields.insert(key, json_value);
        }
    }

    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry
                .fields
                .insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }
        for (key, value) in &context.context_fields {
            entry.fields.insert(key.clone(), value.clone());
        }
        drop(context);

        let output = self.render(&entry);
        match &self.progress_bar {
            Some(bar) => bar.suspend(|| {
                let _ = writeln!(io::stderr(), "{}", output);
            }),
            None => {
                let _ = writeln!(io::stderr(), "{}", output);
            }
        }
    }

    fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
            LogFormat::Compact => self.format_compact(entry),
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short: String = correlation_id.chars().take(8).collect();
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields: Vec<String> = entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!(
                "{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}",
                entry.message
            ),
        }
    }

    fn format_compact(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S");
        format!(
            "{} {} {}: {}",
            timestamp,
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
    }
}

/// Builder for one log entry
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add the phase timings of a request record
    pub fn timing(self, metrics: &DurationMetrics) -> Self {
        self.field("dns_ms", metrics.dns_lookup_ms)
            .field("tcp_ms", metrics.tcp_connect_ms)
            .field("tls_ms", metrics.tls_handshake_ms)
            .field("server_ms", metrics.server_processing_ms)
            .field("transfer_ms", metrics.content_transfer_ms)
            .field("status_code", metrics.status_code)
            .field("reused", metrics.connection_reused)
    }

    pub fn failure(self, failure: &RequestFailure) -> Self {
        self.field("failure_kind", failure.kind).field("failure", &failure.message)
    }

    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logs the lifecycle of one load test run and the problems of its requests
#[derive(Clone)]
pub struct RunLogger {
    logger: Logger,
    run_id: String,
}

impl RunLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("RUN".to_string(), config),
            run_id: Uuid::new_v4().to_string(),
        }
    }

    /// Wrap an existing logger
    pub fn from_logger(logger: Logger) -> Self {
        Self {
            logger,
            run_id: Uuid::new_v4().to_string(),
        }
    }

    /// Write entries around the given progress bar
    pub fn with_progress_bar(mut self, bar: ProgressBar) -> Self {
        self.logger.set_progress_bar(bar);
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn run_started(&self, config: &Config) {
        let message = format!(
            "Starting {} requests against {} with concurrency {}",
            config.total_requests(),
            config.base_url,
            config.concurrency
        );
        self.logger
            .info(&message)
            .correlation_id(&self.run_id)
            .field("target", &config.base_url)
            .field("concurrency", config.concurrency)
            .field("requests", config.total_requests())
            .field("mode", config.mode())
            .field("keep_alive", !config.disable_keep_alive)
            .field("timeout_seconds", config.timeout_seconds)
            .log()
            .await;
    }

    /// A request ended without an HTTP response
    pub async fn request_failed(&self, worker_id: usize, url: &str, failure: &RequestFailure) {
        self.logger
            .warn(&format!("Request to {} failed: {}", url, failure))
            .correlation_id(&self.run_id)
            .field("worker", worker_id)
            .field("url", url)
            .failure(failure)
            .log()
            .await;
    }

    /// The response arrived but its body could not be read to the end
    pub async fn body_error(&self, worker_id: usize, url: &str, status_code: u16, error: &str) {
        self.logger
            .warn(&format!("Reading response body from {} failed: {}", url, error))
            .correlation_id(&self.run_id)
            .field("worker", worker_id)
            .field("url", url)
            .field("status_code", status_code)
            .log()
            .await;
    }

    /// Per-request timings, only emitted at debug level
    pub async fn request_completed(&self, worker_id: usize, url: &str, metrics: &DurationMetrics) {
        if !self.logger.would_log(LogLevel::Debug) {
            return;
        }
        self.logger
            .debug(&format!("{} -> {}", url, metrics.status_code))
            .correlation_id(&self.run_id)
            .field("worker", worker_id)
            .timing(metrics)
            .log()
            .await;
    }

    pub async fn run_completed(&self, stats: &AggregateStats) {
        let message = format!(
            "Completed {} requests in {:.3}s ({} failed, {:.2} req/s)",
            stats.total_requests,
            stats.elapsed().as_secs_f64(),
            stats.failed_requests,
            stats.requests_per_second
        );
        self.logger
            .info(&message)
            .correlation_id(&self.run_id)
            .field("total_requests", stats.total_requests)
            .field("failed_requests", stats.failed_requests)
            .field("elapsed_ms", stats.elapsed_ms)
            .field("requests_per_second", stats.requests_per_second)
            .field("failures_by_kind", &stats.failures_by_kind)
            .log()
            .await;
    }

    pub async fn run_aborted(&self, error: &AppError) {
        self.logger
            .error(&format!("Run aborted: {}", error))
            .correlation_id(&self.run_id)
            .error_info(error)
            .log()
            .await;
    }
}

/// Creates loggers that share one session ID
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub async fn create_run_logger(&self) -> RunLogger {
        RunLogger::from_logger(self.create_logger("RUN").await)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FailureKind;
    use std::str::FromStr;
    use std::time::Duration;

    fn entry(level: LogLevel) -> LogEntry {
        let mut fields = HashMap::new();
        fields.insert("key".to_string(), serde_json::Value::String("value".to_string()));
        LogEntry {
            timestamp: Utc::now(),
            level,
            message: "Test message".to_string(),
            logger: "TEST".to_string(),
            correlation_id: Some("0123456789abcdef".to_string()),
            fields,
        }
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_level_follows_config_flags() {
        let mut config = Config::default();
        assert_eq!(LogLevel::for_config(&config), LogLevel::Warn);
        config.verbose = true;
        assert_eq!(LogLevel::for_config(&config), LogLevel::Info);
        config.debug = true;
        assert_eq!(LogLevel::for_config(&config), LogLevel::Debug);
    }

    #[test]
    fn test_logger_with_config() {
        let config = Config {
            debug: true,
            enable_color: false,
            ..Default::default()
        };

        let logger = Logger::with_config("TEST".to_string(), &config);
        assert_eq!(logger.level(), LogLevel::Debug);
        assert_eq!(logger.format, LogFormat::Json);
        assert!(!logger.use_color);
    }

    #[test]
    fn test_would_log() {
        let mut logger = Logger::new("TEST".to_string());
        logger.set_level(LogLevel::Warn);

        assert!(!logger.would_log(LogLevel::Debug));
        assert!(!logger.would_log(LogLevel::Info));
        assert!(logger.would_log(LogLevel::Warn));
        assert!(logger.would_log(LogLevel::Error));
    }

    #[test]
    fn test_log_formats() {
        let mut logger = Logger::new("TEST".to_string());
        logger.set_color(false);

        let console = logger.format_console(&entry(LogLevel::Info));
        assert!(console.contains(" INFO [TEST] Test message [01234567]"));
        assert!(console.contains("key=\"value\""));

        let json = logger.format_json(&entry(LogLevel::Info));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["level"], "Info");
        assert_eq!(parsed["fields"]["key"], "value");

        let compact = logger.format_compact(&entry(LogLevel::Warn));
        assert!(compact.contains(" W TEST: Test message"));
    }

    #[tokio::test]
    async fn test_context_fields_are_attached() {
        let logger = Logger::new("TEST".to_string());
        logger.set_session_id("session-1".to_string()).await;
        logger.add_context_field("target".to_string(), "http://example.test").await;

        let context = logger.context.read().await;
        assert_eq!(context.session_id.as_deref(), Some("session-1"));
        assert!(context.context_fields.contains_key("target"));
    }

    #[tokio::test]
    async fn test_run_logger_events() {
        let config = Config::for_target("http://127.0.0.1:8080", 2, 4);
        let logger = RunLogger::new(&config);
        assert!(!logger.run_id().is_empty());

        let failure = RequestFailure::new(FailureKind::Connect, "connection refused");
        logger.run_started(&config).await;
        logger.request_failed(0, "http://127.0.0.1:8080/", &failure).await;
        logger.body_error(1, "http://127.0.0.1:8080/", 200, "unexpected eof").await;

        let metrics = DurationMetrics::completed(
            Duration::ZERO,
            Duration::from_millis(1),
            Duration::ZERO,
            Duration::from_millis(2),
            Duration::from_millis(3),
            200,
        );
        logger.request_completed(1, "http://127.0.0.1:8080/", &metrics).await;
        logger.run_aborted(&AppError::internal("boom")).await;
    }

    #[tokio::test]
    async fn test_entries_written_while_bar_suspended() {
        let config = Config::for_target("http://127.0.0.1:8080", 1, 3);
        let bar = ProgressBar::hidden();
        bar.set_length(3);
        bar.inc(1);

        let logger = RunLogger::new(&config).with_progress_bar(bar.clone());
        assert!(logger.logger().progress_bar().is_some());

        let failure = RequestFailure::new(FailureKind::Timeout, "timed out");
        logger.request_failed(0, "http://127.0.0.1:8080/", &failure).await;

        // the bar is left as it was
        assert_eq!(bar.position(), 1);
        assert!(!bar.is_finished());
    }

    #[tokio::test]
    async fn test_logger_factory_shares_session() {
        let factory = LoggerFactory::new(Config::default());
        let logger = factory.create_logger("TEST").await;
        assert_eq!(logger.name(), "TEST");

        let run_logger = factory.create_run_logger().await;
        let context = run_logger.logger().context.read().await;
        assert_eq!(context.session_id.as_deref(), Some(factory.session_id()));
    }
}
