//! Completion notifications from workers

use std::sync::atomic::{AtomicU64, Ordering};

/// Receives one notification per completed request.
///
/// Implementations are shared by every worker and must tolerate concurrent
/// calls.
pub trait ProgressObserver: Send + Sync {
    fn on_request_complete(&self);

    /// All workers have finished
    fn on_run_complete(&self) {}
}

/// Lock-free completed-request counter
#[derive(Debug, Default)]
pub struct ProgressCounter {
    completed: AtomicU64,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

impl ProgressObserver for ProgressCounter {
    fn on_request_complete(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}
