//! Colored formatter implementation with terminal color support
//!
//! Same layout as the plain formatter. Statistic values are highlighted
//! and the failure count is colored by how bad the failure rate is.

use super::formatter::{
    fmt_err, format_duration, phase_rows, phase_table_format, totals_lines, CellPosition, FormattingOptions,
    PlainFormatter, SummaryFormatter,
};
use crate::{
    error::Result,
    models::{AggregateStats, Config},
};
use colored::*;
use std::fmt::Write as _;

/// Failure-rate classification for color coding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureLevel {
    None,
    Low,
    High,
}

impl FailureLevel {
    /// Below 5% is low, anything above is high
    pub fn from_rate(failure_rate: f64) -> Self {
        if failure_rate <= 0.0 {
            Self::None
        } else if failure_rate < 5.0 {
            Self::Low
        } else {
            Self::High
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub value: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            value: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::BrightBlack,
            border: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain_formatter: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        let plain_formatter = PlainFormatter::new(options.clone());
        Self {
            plain_formatter,
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    fn emphasized(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.bold().color(color)
        } else {
            text.normal()
        }
    }

    fn value(&self, text: &str) -> ColoredString {
        self.colorize(text, self.color_scheme.value)
    }

    fn style_cell(&self, position: CellPosition, cell: String) -> String {
        match position.row {
            None => self.emphasized(&cell, self.color_scheme.header).to_string(),
            Some(_) if position.column == 0 => cell,
            Some(_) if cell.trim() == "N/A" => self.colorize(&cell, self.color_scheme.muted).to_string(),
            Some(_) => self.value(&cell).to_string(),
        }
    }

    fn failure_color(&self, stats: &AggregateStats) -> Color {
        match FailureLevel::from_rate(stats.failure_rate()) {
            FailureLevel::None => self.color_scheme.success,
            FailureLevel::Low => self.color_scheme.warning,
            FailureLevel::High => self.color_scheme.error,
        }
    }

    fn format_breakdown(&self, stats: &AggregateStats) -> Result<String> {
        let mut output = String::new();

        if self.options.verbose_mode && !stats.status_codes.is_empty() {
            writeln!(output, "{}", self.bold("Status Codes:")).map_err(fmt_err)?;
            for (code, count) in &stats.status_codes {
                let color = if (200..300).contains(code) {
                    self.color_scheme.success
                } else {
                    self.color_scheme.warning
                };
                writeln!(
                    output,
                    "  {} {}",
                    self.colorize(&format!("{:<16}", code), color),
                    self.value(&count.to_string())
                )
                .map_err(fmt_err)?;
            }
        }

        if !stats.failures_by_kind.is_empty() {
            writeln!(output, "{}", self.bold("Transport Failures:")).map_err(fmt_err)?;
            for (kind, count) in &stats.failures_by_kind {
                writeln!(
                    output,
                    "  {} {}",
                    self.colorize(&format!("{:<16}", kind.as_str()), self.color_scheme.error),
                    self.value(&count.to_string())
                )
                .map_err(fmt_err)?;
            }
        }

        Ok(output.trim_end().to_string())
    }
}

impl SummaryFormatter for ColoredFormatter {
    fn format_run_start(&self, config: &Config) -> Result<String> {
        let mut output = String::new();
        let title = format!("Starting Load Test with {} concurrent users", config.concurrency);

        if self.options.enable_color {
            writeln!(output, "{}", title.as_str().cyan().underline()).map_err(fmt_err)?;
        } else {
            writeln!(output, "{}", title).map_err(fmt_err)?;
        }
        write!(
            output,
            "Target: {} ({} requests, {} mode)",
            self.value(&config.base_url),
            self.value(&config.total_requests().to_string()),
            config.mode().as_str()
        )
        .map_err(fmt_err)?;

        Ok(output)
    }

    fn format_summary(&self, stats: &AggregateStats) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "Elapsed Time: {}", self.value(&format_duration(stats.elapsed_ms))).map_err(fmt_err)?;
        writeln!(output).map_err(fmt_err)?;

        let format = phase_table_format(&self.options);
        let rows = phase_rows(stats, &self.options);
        let table = self
            .plain_formatter
            .create_styled_table(&format, &rows, |position, cell| self.style_cell(position, cell))?;
        writeln!(output, "{}", table).map_err(fmt_err)?;
        writeln!(output).map_err(fmt_err)?;

        for (label, value) in totals_lines(stats) {
            let value = if label.starts_with("Failed") {
                self.colorize(&value, self.failure_color(stats))
            } else {
                self.value(&value)
            };
            writeln!(output, "{:<18} {}", label, value).map_err(fmt_err)?;
        }

        let breakdown = self.format_breakdown(stats)?;
        if !breakdown.is_empty() {
            writeln!(output).map_err(fmt_err)?;
            writeln!(output, "{}", breakdown).map_err(fmt_err)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasized("Warning:", self.color_scheme.warning), warning))
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!(
            "{} {}",
            self.emphasized("Error:", self.color_scheme.error),
            self.colorize(error, self.color_scheme.error)
        ))
    }
}
