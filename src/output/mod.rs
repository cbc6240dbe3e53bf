//! Output formatting and display system
//!
//! Renders run banners and end-of-run summaries as plain text, colored
//! text or JSON, and drives the terminal progress bar.

mod colored;
mod formatter;
mod json;
mod progress;

pub use self::colored::{ColorScheme, ColoredFormatter, FailureLevel};
pub use formatter::{Alignment, CellPosition, Column, FormattingOptions, PlainFormatter, RowData, SummaryFormatter, TableFormat};
pub use json::JsonFormatter;
pub use progress::RequestProgressBar;

use crate::{error::Result, models::{AggregateStats, Config}};
use std::sync::Arc;

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// JSON when requested, otherwise colored or plain text
    pub fn create_formatter(config: &Config) -> Box<dyn SummaryFormatter> {
        if config.json_output {
            return Box::new(JsonFormatter::new());
        }

        let options = FormattingOptions::from_config(config);
        if options.enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Visible bar unless progress is disabled or stdout carries JSON
    pub fn create_progress(config: &Config) -> Arc<RequestProgressBar> {
        let total = config.total_requests();
        if config.show_progress && !config.json_output {
            Arc::new(RequestProgressBar::new(total))
        } else {
            Arc::new(RequestProgressBar::hidden(total))
        }
    }
}

/// Routes formatted output: banners and summaries to stdout, warnings to stderr
pub struct OutputCoordinator {
    formatter: Box<dyn SummaryFormatter>,
}

impl OutputCoordinator {
    pub fn new(formatter: Box<dyn SummaryFormatter>) -> Self {
        Self { formatter }
    }

    pub fn for_config(config: &Config) -> Self {
        Self::new(OutputFormatterFactory::create_formatter(config))
    }

    pub fn formatter(&self) -> &dyn SummaryFormatter {
        self.formatter.as_ref()
    }

    pub fn display_run_start(&self, config: &Config) -> Result<()> {
        let banner = self.formatter.format_run_start(config)?;
        if !banner.is_empty() {
            println!("{}", banner);
        }
        Ok(())
    }

    pub fn display_warning(&self, warning: &str) -> Result<()> {
        eprintln!("{}", self.formatter.format_warning(warning)?);
        Ok(())
    }

    pub fn display_summary(&self, stats: &AggregateStats) -> Result<()> {
        println!("{}", self.formatter.format_summary(stats)?);
        Ok(())
    }
}
