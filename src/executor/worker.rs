//! A single load-generating worker

use crate::{
    client::{RequestExecutor, RequestTrace},
    executor::progress::ProgressObserver,
    logging::RunLogger,
    models::{DurationMetrics, RequestFailure},
    types::WorkToken,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// Pulls tokens from the work queue until it closes, producing one record per token
pub struct Worker {
    id: usize,
    executor: Arc<dyn RequestExecutor>,
    base_url: Url,
    tls: bool,
    progress: Arc<dyn ProgressObserver>,
    logger: RunLogger,
}

impl Worker {
    pub fn new(
        id: usize,
        executor: Arc<dyn RequestExecutor>,
        base_url: Url,
        progress: Arc<dyn ProgressObserver>,
        logger: RunLogger,
    ) -> Self {
        let tls = base_url.scheme() == "https";
        Self {
            id,
            executor,
            base_url,
            tls,
            progress,
            logger,
        }
    }

    /// Consume tokens until the queue is closed and empty.
    ///
    /// Returns the number of records sent.
    pub async fn run(
        self,
        queue: flume::Receiver<WorkToken>,
        results: mpsc::Sender<DurationMetrics>,
    ) -> usize {
        let mut processed = 0;
        while let Ok(token) = queue.recv_async().await {
            let record = self.process(&token).await;
            self.progress.on_request_complete();
            if results.send(record).await.is_err() {
                break;
            }
            processed += 1;
        }
        processed
    }

    /// Issue the request for one token and turn its outcome into a record
    pub async fn process(&self, token: &WorkToken) -> DurationMetrics {
        let url = match token.target_url(&self.base_url) {
            Ok(url) => url,
            Err(e) => {
                let failure = RequestFailure::from_error(&e);
                self.logger.request_failed(self.id, &format!("{:?}", token), &failure).await;
                return DurationMetrics::failed(failure);
            }
        };

        let mut trace = RequestTrace::new();
        match self.executor.execute(&url, &mut trace).await {
            Ok(response) => {
                if let Some(error) = &response.body_error {
                    self.logger.body_error(self.id, url.as_str(), response.status_code, error).await;
                }
                let metrics = trace.into_metrics(response.status_code, self.tls);
                self.logger.request_completed(self.id, url.as_str(), &metrics).await;
                metrics
            }
            Err(e) => {
                let failure = RequestFailure::from_error(&e);
                self.logger.request_failed(self.id, url.as_str(), &failure).await;
                DurationMetrics::failed(failure)
            }
        }
    }
}
