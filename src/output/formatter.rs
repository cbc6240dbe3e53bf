//! Core formatting traits and implementations
//!
//! This module defines the summary formatting interface and provides
//! a plain text implementation with table formatting capabilities.

use crate::{
    error::{AppError, Result},
    models::{AggregateStats, Config, PhaseStats},
};
use std::fmt::Write as _;

/// Renders the user-facing parts of a load test run
pub trait SummaryFormatter: Send + Sync {
    /// Banner printed before the first request is dispatched
    fn format_run_start(&self, config: &Config) -> Result<String>;

    /// Complete end-of-run summary
    fn format_summary(&self, stats: &AggregateStats) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;

    /// Format error messages
    fn format_error(&self, error: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Show sample counts and the status code breakdown
    pub verbose_mode: bool,
    /// Show table borders
    pub table_borders: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
        }
    }
}

impl FormattingOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enable_color: config.enable_color,
            verbose_mode: config.verbose,
            table_borders: true,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Show borders around table
    pub show_borders: bool,
    /// Show header row
    pub show_header: bool,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
}

impl Column {
    pub fn new(header: &str, alignment: Alignment, min_width: usize) -> Self {
        Self {
            header: header.to_string(),
            alignment,
            min_width,
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// Position of a cell handed to a table styling function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPosition {
    /// `None` for the header row
    pub row: Option<usize>,
    pub column: usize,
}

/// Column layout of the phase table
pub(crate) fn phase_table_format(options: &FormattingOptions) -> TableFormat {
    let mut columns = vec![
        Column::new("Phase", Alignment::Left, 17),
        Column::new("Mean", Alignment::Right, 10),
        Column::new("Median", Alignment::Right, 10),
        Column::new("P95", Alignment::Right, 10),
    ];
    if options.verbose_mode {
        columns.push(Column::new("Samples", Alignment::Right, 7));
    }

    TableFormat {
        columns,
        show_borders: options.table_borders,
        show_header: true,
    }
}

/// One row per phase, TLS only when the target used it
pub(crate) fn phase_rows(stats: &AggregateStats, options: &FormattingOptions) -> Vec<RowData> {
    stats
        .phases()
        .into_iter()
        .map(|(name, phase)| {
            let mut row = vec![
                name.to_string(),
                PhaseStats::format_value(phase.mean),
                PhaseStats::format_value(phase.median),
                PhaseStats::format_value(phase.p95),
            ];
            if options.verbose_mode {
                row.push(phase.samples.to_string());
            }
            row
        })
        .collect()
}

/// Label/value pairs below the phase table
pub(crate) fn totals_lines(stats: &AggregateStats) -> Vec<(&'static str, String)> {
    vec![
        ("Total Requests:", stats.total_requests.to_string()),
        ("Successful:", stats.successful_requests().to_string()),
        (
            "Failed Requests:",
            format!("{} ({})", stats.failed_requests, format_percentage(stats.failure_rate())),
        ),
        ("Requests/sec:", format!("{:.2}", stats.requests_per_second)),
    ]
}

/// Format duration in human-readable format
pub(crate) fn format_duration(duration_ms: f64) -> String {
    if duration_ms < 1.0 {
        format!("{:.2}μs", duration_ms * 1000.0)
    } else if duration_ms < 1000.0 {
        format!("{:.1}ms", duration_ms)
    } else if duration_ms < 60000.0 {
        format!("{:.2}s", duration_ms / 1000.0)
    } else {
        let minutes = (duration_ms / 60000.0) as u32;
        let seconds = (duration_ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

/// Format percentage with appropriate precision
pub(crate) fn format_percentage(percentage: f64) -> String {
    if percentage >= 99.95 {
        "100.0%".to_string()
    } else if percentage < 0.05 {
        "0.0%".to_string()
    } else {
        format!("{:.1}%", percentage)
    }
}

pub(crate) fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::io(format!("Failed to format output: {}", e))
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }

    /// Create a table with the given format and data
    pub fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> Result<String> {
        self.create_styled_table(format, rows, |_, cell| cell)
    }

    /// Create a table, passing every padded cell through `style`.
    ///
    /// Widths are computed from the unstyled text so escape sequences
    /// added by `style` do not break alignment.
    pub fn create_styled_table<F>(&self, format: &TableFormat, rows: &[RowData], style: F) -> Result<String>
    where
        F: Fn(CellPosition, String) -> String,
    {
        if rows.is_empty() {
            return Ok(String::new());
        }

        let column_widths = self.calculate_column_widths(format, rows);
        let mut output = String::new();

        if format.show_header && !format.columns.is_empty() {
            if format.show_borders {
                writeln!(output, "{}", self.create_horizontal_border(&column_widths)).map_err(fmt_err)?;
            }

            let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
            writeln!(output, "{}", self.create_row(&headers, None, &column_widths, format, &style))
                .map_err(fmt_err)?;

            if format.show_borders {
                writeln!(output, "{}", self.create_horizontal_border(&column_widths)).map_err(fmt_err)?;
            }
        }

        for (idx, row) in rows.iter().enumerate() {
            writeln!(output, "{}", self.create_row(row, Some(idx), &column_widths, format, &style))
                .map_err(fmt_err)?;
        }

        if format.show_borders {
            write!(output, "{}", self.create_horizontal_border(&column_widths)).map_err(fmt_err)?;
        }

        Ok(output.trim_end_matches('\n').to_string())
    }

    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        let num_columns = format
            .columns
            .len()
            .max(rows.iter().map(|r| r.len()).max().unwrap_or(0));

        (0..num_columns)
            .map(|col_idx| {
                let base = format
                    .columns
                    .get(col_idx)
                    .map_or(0, |c| c.min_width.max(display_width(&c.header)));

                rows.iter()
                    .filter_map(|row| row.get(col_idx))
                    .map(|cell| display_width(cell))
                    .fold(base, usize::max)
            })
            .collect()
    }

    fn create_row<F>(
        &self,
        data: &[String],
        row: Option<usize>,
        widths: &[usize],
        format: &TableFormat,
        style: &F,
    ) -> String
    where
        F: Fn(CellPosition, String) -> String,
    {
        let mut line = String::new();

        if format.show_borders {
            line.push('|');
        }

        for (column, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
            let alignment = format
                .columns
                .get(column)
                .map_or(Alignment::Left, |c| c.alignment);

            let padded = self.align_text(cell, width, alignment);
            let styled = style(CellPosition { row, column }, padded);

            if format.show_borders {
                line.push(' ');
                line.push_str(&styled);
                line.push_str(" |");
            } else {
                line.push_str(&styled);
                line.push_str("  ");
            }
        }

        line.trim_end().to_string()
    }

    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::new();

        if !widths.is_empty() {
            border.push('+');
            for &width in widths {
                border.push_str(&"-".repeat(width + 2));
                border.push('+');
            }
        }

        border
    }

    /// Align text within specified width
    fn align_text(&self, text: &str, width: usize, alignment: Alignment) -> String {
        let len = display_width(text);
        if len >= width {
            return text.to_string();
        }

        let padding = width - len;
        match alignment {
            Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
            Alignment::Right => format!("{}{}", " ".repeat(padding), text),
            Alignment::Center => {
                let left_pad = padding / 2;
                let right_pad = padding - left_pad;
                format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
            }
        }
    }

    fn format_breakdown(&self, stats: &AggregateStats) -> Result<String> {
        let mut output = String::new();

        if self.options.verbose_mode && !stats.status_codes.is_empty() {
            writeln!(output, "Status Codes:").map_err(fmt_err)?;
            for (code, count) in &stats.status_codes {
                writeln!(output, "  {:<16} {}", code, count).map_err(fmt_err)?;
            }
        }

        if !stats.failures_by_kind.is_empty() {
            writeln!(output, "Transport Failures:").map_err(fmt_err)?;
            for (kind, count) in &stats.failures_by_kind {
                writeln!(output, "  {:<16} {}", kind.as_str(), count).map_err(fmt_err)?;
            }
        }

        Ok(output.trim_end().to_string())
    }
}

impl SummaryFormatter for PlainFormatter {
    fn format_run_start(&self, config: &Config) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "Starting Load Test with {} concurrent users", config.concurrency).map_err(fmt_err)?;
        write!(
            output,
            "Target: {} ({} requests, {} mode)",
            config.base_url,
            config.total_requests(),
            config.mode().as_str()
        )
        .map_err(fmt_err)?;
        Ok(output)
    }

    fn format_summary(&self, stats: &AggregateStats) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "Elapsed Time: {}", format_duration(stats.elapsed_ms)).map_err(fmt_err)?;
        writeln!(output).map_err(fmt_err)?;

        let format = phase_table_format(&self.options);
        let rows = phase_rows(stats, &self.options);
        writeln!(output, "{}", self.create_table(&format, &rows)?).map_err(fmt_err)?;
        writeln!(output).map_err(fmt_err)?;

        for (label, value) in totals_lines(stats) {
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
        Ok(format!("Warning: {}", warning))
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("Error: {}", error))
    }
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}
