//! Configuration validation beyond the hard errors of `Config::validate`

use crate::{error::Result, models::Config};
use colored::Colorize;

/// Produces non-fatal warnings about settings that are legal but questionable
pub struct ConfigValidator;

impl ConfigValidator {
    /// Run the hard checks, then collect warnings
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ConfigWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::check_target(config)?);
        warnings.extend(Self::check_concurrency(config));
        warnings.extend(Self::check_timing(config));
        Ok(warnings)
    }

    fn check_target(config: &Config) -> Result<Vec<ConfigWarning>> {
        let mut warnings = Vec::new();
        let parsed = config.parsed_url()?;

        if parsed.query().is_some() && config.url_suffixes.is_some() {
            warnings.push(ConfigWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Target URL '{}' has a query string; suffixes are appended after it",
                    config.base_url
                ),
            ));
        }

        if let Some(url::Host::Ipv4(ip)) = parsed.host() {
            if ip.is_loopback() {
                warnings.push(ConfigWarning::new(
                    ValidationLevel::Info,
                    format!("Target {} is a loopback address; the load generator competes with the server for CPU", ip),
                ));
            }
        }

        Ok(warnings)
    }

    fn check_concurrency(config: &Config) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let total = config.total_requests();

        if config.concurrency > total {
            warnings.push(ConfigWarning::new(
                ValidationLevel::Info,
                format!(
                    "Concurrency {} exceeds the request count {}; only {} workers will receive work",
                    config.concurrency, total, total
                ),
            ));
        }

        if config.concurrency > config.pool.max_per_host {
            warnings.push(ConfigWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Concurrency {} exceeds the {} connections allowed per host; extra workers wait for a connection",
                    config.concurrency, config.pool.max_per_host
                ),
            ));
        }

        if config.disable_keep_alive && config.concurrency > 100 {
            warnings.push(ConfigWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Keep-alive is disabled with concurrency {}; every request opens a connection and may exhaust local ports",
                    config.concurrency
                ),
            ));
        }

        if total > 100_000 {
            warnings.push(ConfigWarning::new(
                ValidationLevel::Info,
                format!("Run will issue {} requests", total),
            ));
        }

        warnings
    }

    fn check_timing(config: &Config) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if config.timeout_seconds < 2 {
            warnings.push(ConfigWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Timeout of {}s may count slow but healthy responses as failures",
                    config.timeout_seconds
                ),
            ));
        }

        match config.tcp_outlier_threshold_ms {
            None => warnings.push(ConfigWarning::new(
                ValidationLevel::Info,
                "TCP outlier filter is disabled; every connect sample is kept".to_string(),
            )),
            Some(threshold) if threshold >= config.timeout_seconds as f64 * 1000.0 => {
                warnings.push(ConfigWarning::new(
                    ValidationLevel::Info,
                    format!(
                        "TCP outlier threshold of {}ms is not below the {}s timeout and never applies",
                        threshold, config.timeout_seconds
                    ),
                ));
            }
            Some(_) => {}
        }

        warnings
    }
}

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

/// A non-fatal configuration finding
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ConfigWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        let tag = format!("[{}]", self.level.as_str());
        if !use_color {
            return format!("{} {}", tag, self.message);
        }
        let tag = match self.level {
            ValidationLevel::Info => tag.as_str().blue(),
            ValidationLevel::Warning => tag.as_str().yellow(),
        };
        format!("{} {}", tag, self.message)
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ConfigWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
