//! Configuration data model and validation

use crate::types::{AppError, Result, RunMode, WorkToken};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection pool limits for the traced HTTP client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolLimits {
    /// Maximum idle connections kept across all hosts
    #[serde(default = "default_max_idle")]
    pub max_idle: usize,

    /// Maximum idle connections kept for a single host
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,

    /// Maximum live (idle + in use) connections for a single host
    #[serde(default = "default_max_per_host")]
    pub max_per_host: usize,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            max_idle: default_max_idle(),
            max_idle_per_host: default_max_idle_per_host(),
            max_per_host: default_max_per_host(),
        }
    }
}

impl PoolLimits {
    /// Idle connections retained for the single target host
    pub fn idle_capacity(&self) -> usize {
        self.max_idle.min(self.max_idle_per_host)
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target URL every request is sent to (suffixes are appended in file mode)
    #[serde(default)]
    pub base_url: String,

    /// Number of concurrent workers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Total number of requests in count mode
    #[serde(default = "default_requests")]
    pub requests: usize,

    /// URL suffixes read from a file; presence switches the run to file mode
    #[serde(default)]
    pub url_suffixes: Option<Vec<String>>,

    /// Path the suffixes were read from
    #[serde(default)]
    pub suffix_file: Option<String>,

    /// Per-request client timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// TCP connect samples at or above this many milliseconds are dropped
    #[serde(default = "default_tcp_outlier_threshold")]
    pub tcp_outlier_threshold_ms: Option<f64>,

    /// Open a fresh connection for every request
    #[serde(default)]
    pub disable_keep_alive: bool,

    #[serde(default)]
    pub pool: PoolLimits,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,

    /// Print the summary as JSON
    #[serde(default)]
    pub json_output: bool,

    /// Render a progress bar while the run is in flight
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            concurrency: default_concurrency(),
            requests: default_requests(),
            url_suffixes: None,
            suffix_file: None,
            timeout_seconds: default_timeout_secs(),
            tcp_outlier_threshold_ms: default_tcp_outlier_threshold(),
            disable_keep_alive: false,
            pool: PoolLimits::default(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
            json_output: false,
            show_progress: default_show_progress(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a count-mode configuration for a target
    pub fn for_target<S: Into<String>>(base_url: S, concurrency: usize, requests: usize) -> Self {
        Self {
            base_url: base_url.into(),
            concurrency,
            requests,
            ..Self::default()
        }
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Parse the base URL
    pub fn parsed_url(&self) -> Result<url::Url> {
        url::Url::parse(&self.base_url)
            .map_err(|e| AppError::config(format!("Invalid target URL '{}': {}", self.base_url, e)))
    }

    /// Whether the target is served over TLS
    pub fn is_tls(&self) -> bool {
        self.base_url.trim_start().to_ascii_lowercase().starts_with("https://")
    }

    pub fn mode(&self) -> RunMode {
        if self.url_suffixes.is_some() {
            RunMode::File
        } else {
            RunMode::Count
        }
    }

    /// Number of requests the run will issue; the suffix list length wins in file mode
    pub fn total_requests(&self) -> usize {
        match &self.url_suffixes {
            Some(suffixes) => suffixes.len(),
            None => self.requests,
        }
    }

    /// Build the full set of work tokens for this run
    pub fn work_tokens(&self) -> Vec<WorkToken> {
        match &self.url_suffixes {
            Some(suffixes) => suffixes.iter().cloned().map(WorkToken::Suffix).collect(),
            None => vec![WorkToken::Repeat; self.requests],
        }
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(AppError::config("Target URL must be provided (--url or LOAD_URL)"));
        }

        let parsed = self.parsed_url()?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::config(format!(
                "Target URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(AppError::config(format!("Target URL has no host: {}", self.base_url)));
        }

        if self.concurrency == 0 {
            return Err(AppError::config("Concurrency must be greater than 0"));
        }

        match &self.url_suffixes {
            Some(suffixes) if suffixes.is_empty() => {
                return Err(AppError::config("Suffix file contains no URL suffixes"));
            }
            None if self.requests == 0 => {
                return Err(AppError::config("Request count must be greater than 0"));
            }
            _ => {}
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_seconds > 300 {
            return Err(AppError::config("Timeout cannot exceed 300 seconds"));
        }

        if let Some(threshold) = self.tcp_outlier_threshold_ms {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(AppError::config(format!(
                    "TCP outlier threshold must be a positive number of milliseconds, got {}",
                    threshold
                )));
            }
        }

        if self.pool.max_per_host == 0 {
            return Err(AppError::config("Maximum connections per host must be greater than 0"));
        }

        Ok(())
    }

    /// Merge values from an arbitrary variable source
    pub fn merge_from_lookup<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LOAD_URL") {
            let url = url.trim();
            if !url.is_empty() {
                self.base_url = url.to_string();
            }
        }

        if let Some(concurrency) = lookup("LOAD_CONCURRENCY") {
            self.concurrency = concurrency.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid LOAD_CONCURRENCY value '{}': {}", concurrency, e)))?;
        }

        if let Some(requests) = lookup("LOAD_REQUESTS") {
            self.requests = requests.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid LOAD_REQUESTS value '{}': {}", requests, e)))?;
        }

        if let Some(timeout) = lookup("LOAD_TIMEOUT_SECONDS") {
            self.timeout_seconds = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid LOAD_TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Some(threshold) = lookup("LOAD_TCP_OUTLIER_MS") {
            let value: f64 = threshold.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid LOAD_TCP_OUTLIER_MS value '{}': {}", threshold, e)))?;
            self.tcp_outlier_threshold_ms = outlier_threshold_from_ms(value);
        }

        if let Some(enable_color) = lookup("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

/// `0` turns the TCP outlier filter off
pub fn outlier_threshold_from_ms(value: f64) -> Option<f64> {
    if value == 0.0 {
        None
    } else {
        Some(value)
    }
}

// Default value functions for serde
fn default_concurrency() -> usize {
    crate::defaults::DEFAULT_CONCURRENCY
}

fn default_requests() -> usize {
    crate::defaults::DEFAULT_REQUESTS
}

fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_tcp_outlier_threshold() -> Option<f64> {
    Some(crate::defaults::DEFAULT_TCP_OUTLIER_THRESHOLD_MS)
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

fn default_show_progress() -> bool {
    true
}

fn default_max_idle() -> usize {
    crate::defaults::DEFAULT_MAX_IDLE_CONNECTIONS
}

fn default_max_idle_per_host() -> usize {
    crate::defaults::DEFAULT_MAX_IDLE_PER_HOST
}

fn default_max_per_host() -> usize {
    crate::defaults::DEFAULT_MAX_CONNECTIONS_PER_HOST
}
