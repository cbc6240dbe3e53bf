//! Terminal progress bar for a running load test

use crate::executor::ProgressObserver;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})";

/// Progress bar sized to the total request count, drawn on stderr
pub struct RequestProgressBar {
    bar: ProgressBar,
}

impl RequestProgressBar {
    pub fn new(total_requests: usize) -> Self {
        let bar = ProgressBar::new(total_requests as u64);
        // falls back to the default style if the template is rejected
        if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
            bar.set_style(style.progress_chars("=>-"));
        }
        Self { bar }
    }

    /// Counts progress without drawing anything
    pub fn hidden(total_requests: usize) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total_requests as u64), ProgressDrawTarget::hidden());
        Self { bar }
    }

    /// Handle to the underlying bar, shared with the run logger
    pub fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

impl ProgressObserver for RequestProgressBar {
    fn on_request_complete(&self) {
        self.bar.inc(1);
    }

    fn on_run_complete(&self) {
        self.bar.finish_and_clear();
    }
}
