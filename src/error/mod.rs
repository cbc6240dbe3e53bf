//! Error handling for the HTTP load tester

use thiserror::Error;

/// Custom error types for the HTTP load tester
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// DNS resolution errors
    #[error("DNS resolution error: {0}")]
    DnsResolution(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// TLS setup or handshake errors
    #[error("TLS error: {0}")]
    Tls(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (URLs, JSON, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Load test execution errors
    #[error("Test execution error: {0}")]
    TestExecution(String),

    /// Statistics calculation errors
    #[error("Statistics error: {0}")]
    Statistics(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new DNS resolution error
    pub fn dns_resolution<S: Into<String>>(message: S) -> Self {
        Self::DnsResolution(message.into())
    }

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new TLS error
    pub fn tls<S: Into<String>>(message: S) -> Self {
        Self::Tls(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new test execution error
    pub fn test_execution<S: Into<String>>(message: S) -> Self {
        Self::TestExecution(message.into())
    }

    /// Create a new statistics error
    pub fn statistics<S: Into<String>>(message: S) -> Self {
        Self::Statistics(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// The message carried by the error, without its category prefix
    pub fn detail(&self) -> &str {
        match self {
            Self::Config(message)
            | Self::Network(message)
            | Self::DnsResolution(message)
            | Self::HttpRequest(message)
            | Self::Tls(message)
            | Self::Timeout(message)
            | Self::Validation(message)
            | Self::Io(message)
            | Self::Parse(message)
            | Self::TestExecution(message)
            | Self::Statistics(message)
            | Self::Internal(message) => message,
        }
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Network(_) => "NETWORK",
            Self::DnsResolution(_) => "DNS",
            Self::HttpRequest(_) => "HTTP",
            Self::Tls(_) => "TLS",
            Self::Timeout(_) => "TIMEOUT",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::TestExecution(_) => "TEST",
            Self::Statistics(_) => "STATS",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error only affects a single request (the run can continue)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::HttpRequest(_) | Self::Timeout(_) | Self::DnsResolution(_) | Self::Tls(_) => true,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => false,
            Self::Io(_) | Self::TestExecution(_) | Self::Statistics(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file or command line arguments.", msg)
            }
            Self::Network(msg) => {
                format!("Network connectivity issue: {}\n\nSuggestion: Check that the target is reachable from this machine.", msg)
            }
            Self::DnsResolution(msg) => {
                format!("DNS resolution failed: {}\n\nSuggestion: Check that the target hostname exists.", msg)
            }
            Self::HttpRequest(msg) => {
                format!("HTTP request failed: {}\n\nSuggestion: The target server may be down or rejecting requests.", msg)
            }
            Self::Tls(msg) => {
                format!("TLS failure: {}\n\nSuggestion: Check that the target presents a certificate trusted by the webpki roots.", msg)
            }
            Self::Timeout(msg) => {
                format!("Request timed out: {}\n\nSuggestion: Increase the timeout value using --timeout or lower the concurrency.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check the URL, concurrency and request count.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check that the suffix file exists and is readable.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the format of your input data or configuration files.", msg)
            }
            Self::TestExecution(msg) => {
                format!("Test execution failed: {}\n\nSuggestion: This may be a temporary issue. Try running the test again.", msg)
            }
            Self::Statistics(msg) => {
                format!("Statistics calculation failed: {}\n\nSuggestion: This may indicate insufficient or invalid test data.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,  // Invalid configuration/usage
            Self::Network(_) | Self::DnsResolution(_) | Self::HttpRequest(_) | Self::Tls(_) => 2,  // Network issues
            Self::Timeout(_) => 3,
            Self::Io(_) => 5,
            Self::TestExecution(_) | Self::Statistics(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Network(_) | Self::DnsResolution(_) | Self::HttpRequest(_) | Self::Tls(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Io(_) | Self::TestExecution(_) | Self::Statistics(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::TimedOut {
            Self::timeout(error.to_string())
        } else {
            Self::io(error.to_string())
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<hyper::Error> for AppError {
    fn from(error: hyper::Error) -> Self {
        Self::http_request(error.to_string())
    }
}

impl From<http::Error> for AppError {
    fn from(error: http::Error) -> Self {
        Self::http_request(format!("Failed to build request: {}", error))
    }
}

impl From<rustls::Error> for AppError {
    fn from(error: rustls::Error) -> Self {
        Self::tls(error.to_string())
    }
}

impl From<trust_dns_resolver::error::ResolveError> for AppError {
    fn from(error: trust_dns_resolver::error::ResolveError) -> Self {
        Self::dns_resolution(error.to_string())
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for user feedback on fatal errors
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());
        }
    }
}
