//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env from the current directory if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load a specific env file if it exists; variables already set are kept
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Example .env file content
    pub fn create_example_env_content() -> String {
        r#"# HTTP Load Tester Configuration
#
# Values here are defaults; command-line arguments take precedence.

# Target URL
# LOAD_URL=http://localhost:8080/health

# Number of concurrent workers
# LOAD_CONCURRENCY=10

# Total number of requests (ignored when a suffix file is given)
# LOAD_REQUESTS=1000

# Per-request timeout in seconds (1-300)
# LOAD_TIMEOUT_SECONDS=5

# Drop TCP connect samples at or above this many milliseconds (0 disables)
# LOAD_TCP_OUTLIER_MS=1000

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#
        .to_string()
    }

    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))
    }

    /// Validate the format of one supported variable
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "LOAD_URL" => {
                url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("Invalid LOAD_URL value '{}': {}", value, e)))?;
            }
            "LOAD_CONCURRENCY" | "LOAD_REQUESTS" => {
                let count: usize = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if count == 0 {
                    return Err(AppError::config(format!("{} must be greater than 0", key)));
                }
            }
            "LOAD_TIMEOUT_SECONDS" => {
                let timeout: u64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid LOAD_TIMEOUT_SECONDS value '{}': {}", value, e)))?;
                if timeout == 0 || timeout > 300 {
                    return Err(AppError::config(format!(
                        "LOAD_TIMEOUT_SECONDS must be between 1 and 300, got: {}",
                        timeout
                    )));
                }
            }
            "LOAD_TCP_OUTLIER_MS" => {
                let threshold: f64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid LOAD_TCP_OUTLIER_MS value '{}': {}", value, e)))?;
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(AppError::config(format!(
                        "LOAD_TCP_OUTLIER_MS must be a non-negative number, got: {}",
                        value
                    )));
                }
            }
            "ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Supported variables with descriptions and examples
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("LOAD_URL", "Target URL", "http://localhost:8080/health"),
            ("LOAD_CONCURRENCY", "Number of concurrent workers", "10"),
            ("LOAD_REQUESTS", "Total number of requests", "1000"),
            ("LOAD_TIMEOUT_SECONDS", "Per-request timeout in seconds (1-300)", "5"),
            ("LOAD_TCP_OUTLIER_MS", "TCP connect outlier threshold, 0 disables", "1000"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<22} {}\n", var, description));
            help.push_str(&format!("  {:<22} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Problems with the supported variables currently set
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(name, _, _)| {
                let value = std::env::var(name).ok()?;
                Self::validate_env_var(name, &value).err().map(|e| e.to_string())
            })
            .collect()
    }
}
