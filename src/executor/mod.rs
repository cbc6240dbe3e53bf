//! Load test execution engine
//!
//! This module wires the run together:
//! - `dispatcher` feeds one work token per request into a rendezvous queue
//! - `worker` tasks, exactly `concurrency` of them, consume tokens and issue traced requests
//! - `progress` receives one notification per completed request
//!
//! Records flow through a results channel sized to the request count and are
//! aggregated only after every worker has finished.

pub mod dispatcher;
pub mod progress;
pub mod worker;

pub use dispatcher::Dispatcher;
pub use progress::{ProgressCounter, ProgressObserver};
pub use worker::Worker;

use crate::{
    client::{RequestExecutor, TracedClient},
    error::{AppError, Result},
    logging::RunLogger,
    models::{AggregateStats, Config, DurationMetrics},
    stats::{StatisticsConfig, StatisticsEngine},
};
use futures::future::join_all;
use std::{sync::Arc, time::Instant};
use tokio::sync::mpsc;

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct LoadTestOutcome {
    pub stats: AggregateStats,
    /// Raw per-request records, in completion order
    pub records: Vec<DurationMetrics>,
}

/// One configured load test run
pub struct LoadTest {
    config: Config,
    executor: Arc<dyn RequestExecutor>,
    progress: Arc<dyn ProgressObserver>,
    logger: RunLogger,
}

impl LoadTest {
    /// Validate the configuration and build a run backed by the traced HTTP client
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = TracedClient::new(&config)?;
        Ok(Self::with_executor(config, Arc::new(client)))
    }

    /// Build a run over a custom request executor
    pub fn with_executor(config: Config, executor: Arc<dyn RequestExecutor>) -> Self {
        let logger = RunLogger::new(&config);
        Self {
            config,
            executor,
            progress: Arc::new(ProgressCounter::new()),
            logger,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_logger(mut self, logger: RunLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute every request and aggregate the results.
    ///
    /// Individual request failures end up in the statistics; only a broken
    /// run (a worker panicking, a lost record) is an error.
    pub async fn run(&self) -> Result<LoadTestOutcome> {
        let base_url = self.config.parsed_url()?;
        let dispatcher = Dispatcher::new(self.config.work_tokens());
        let expected = dispatcher.len();
        if self.config.concurrency == 0 {
            return Err(AppError::validation("Concurrency must be greater than 0"));
        }

        self.logger.run_started(&self.config).await;

        let (queue_tx, queue_rx) = dispatcher::work_queue();
        let (results_tx, mut results_rx) = mpsc::channel(expected.max(1));

        let started = Instant::now();
        let mut workers = Vec::with_capacity(self.config.concurrency);
        for id in 0..self.config.concurrency {
            let worker = Worker::new(
                id,
                self.executor.clone(),
                base_url.clone(),
                self.progress.clone(),
                self.logger.clone(),
            );
            workers.push(tokio::spawn(worker.run(queue_rx.clone(), results_tx.clone())));
        }
        drop(queue_rx);
        drop(results_tx);

        let dispatched = dispatcher.run(queue_tx).await;

        // Completion barrier: nothing is aggregated before every worker exits
        let joined = join_all(workers).await;
        let elapsed = started.elapsed();
        self.progress.on_run_complete();

        let panicked = joined.iter().filter(|result| result.is_err()).count();

        let mut engine = StatisticsEngine::with_capacity(StatisticsConfig::from_config(&self.config), expected);
        while let Some(record) = results_rx.recv().await {
            engine.add_record(record);
        }

        if panicked > 0 || dispatched != expected || engine.record_count() != expected {
            let error = AppError::test_execution(format!(
                "Run incomplete: {} of {} requests dispatched, {} records collected, {} workers panicked",
                dispatched,
                expected,
                engine.record_count(),
                panicked
            ));
            self.logger.run_aborted(&error).await;
            return Err(error);
        }

        let stats = engine.aggregate(elapsed);
        self.logger.run_completed(&stats).await;

        Ok(LoadTestOutcome {
            stats,
            records: engine.into_records(),
        })
    }
}
