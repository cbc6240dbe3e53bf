//! Command-line interface

use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

/// HTTP Load Tester - concurrent GET load with per-phase latency breakdown
#[derive(Parser, Debug, Clone)]
#[command(name = "hlt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Target URL (overrides LOAD_URL)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Number of concurrent workers
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Total number of requests (ignored with --file)
    #[arg(short = 'n', long)]
    pub requests: Option<usize>,

    /// File of URL suffixes, one request per line
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(short, long, value_parser = parse_duration)]
    pub timeout: Option<u64>,

    /// Drop TCP connect samples at or above this many milliseconds (0 disables)
    #[arg(long, value_name = "MS", value_parser = parse_outlier_ms)]
    pub tcp_outlier_ms: Option<f64>,

    /// Open a new connection for every request
    #[arg(long)]
    pub disable_keep_alive: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not render a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.concurrency == Some(0) {
            return Err("--concurrency must be greater than 0".to_string());
        }

        if self.requests == Some(0) {
            return Err("--requests must be greater than 0".to_string());
        }

        if let Some(url) = &self.url {
            if url.trim().is_empty() {
                return Err("--url cannot be empty".to_string());
            }
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }

    /// Explicit color choice, if any was given
    pub fn color_override(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            None
        }
    }
}

/// Parse a timeout in whole seconds (1-300)
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 300 {
                Err("Duration cannot exceed 300 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

fn parse_outlier_ms(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("Invalid millisecond value: {}", s))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("Threshold must be a non-negative number, got {}", s));
    }
    Ok(value)
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    std::io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_basic() {
        let cli = Cli::parse_from(["hlt", "-u", "http://localhost:8080", "-c", "5", "-n", "100"]);
        assert_eq!(cli.url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(cli.concurrency, Some(5));
        assert_eq!(cli.requests, Some(100));
        assert_eq!(cli.timeout, None);
        assert!(cli.file.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "hlt",
            "--url", "https://example.com",
            "--concurrency", "8",
            "--file", "paths.txt",
            "--timeout", "30",
            "--tcp-outlier-ms", "0",
            "--disable-keep-alive",
            "--json",
            "--no-progress",
            "--no-color",
            "--verbose",
            "--debug",
        ]);

        assert_eq!(cli.concurrency, Some(8));
        assert_eq!(cli.file, Some(PathBuf::from("paths.txt")));
        assert_eq!(cli.timeout, Some(30));
        assert_eq!(cli.tcp_outlier_ms, Some(0.0));
        assert!(cli.disable_keep_alive);
        assert!(cli.json);
        assert!(cli.no_progress);
        assert!(cli.no_color);
        assert!(cli.verbose);
        assert!(cli.debug);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_conflicts() {
        let cli = Cli::parse_from(["hlt", "--color", "--no-color"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["hlt", "-c", "0"]);
        assert!(cli.validate().unwrap_err().contains("concurrency"));

        let cli = Cli::parse_from(["hlt", "-n", "0"]);
        assert!(cli.validate().unwrap_err().contains("requests"));
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration("1").unwrap(), 1);
        assert_eq!(parse_duration("300").unwrap(), 300);
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("301").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("-5").is_err());
        assert!(parse_duration("+5").is_err());
    }

    #[test]
    fn test_outlier_parsing() {
        assert_eq!(parse_outlier_ms("1000").unwrap(), 1000.0);
        assert_eq!(parse_outlier_ms("2.5").unwrap(), 2.5);
        assert!(parse_outlier_ms("-1").is_err());
        assert!(parse_outlier_ms("inf").is_err());
    }

    #[test]
    fn test_timeout_out_of_range_is_rejected_by_clap() {
        assert!(Cli::try_parse_from(["hlt", "-t", "0"]).is_err());
        assert!(Cli::try_parse_from(["hlt", "-t", "500"]).is_err());
    }

    #[test]
    fn test_color_flags() {
        let cli = Cli::parse_from(["hlt", "--no-color"]);
        assert!(!cli.use_colors());
        assert_eq!(cli.color_override(), Some(false));

        let cli = Cli::parse_from(["hlt", "--color"]);
        assert!(cli.use_colors());
        assert_eq!(cli.color_override(), Some(true));

        let cli = Cli::parse_from(["hlt"]);
        assert_eq!(cli.color_override(), None);
    }
}
