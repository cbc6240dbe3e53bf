//! Feeds work tokens to the worker pool

use crate::types::WorkToken;

/// Create the work queue.
///
/// The queue is a rendezvous channel: a send completes only once a worker
/// takes the token, so tokens are never buffered ahead of the workers.
pub fn work_queue() -> (flume::Sender<WorkToken>, flume::Receiver<WorkToken>) {
    flume::bounded(0)
}

/// Pushes every token of a run into the work queue, then closes it
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tokens: Vec<WorkToken>,
}

impl Dispatcher {
    pub fn new(tokens: Vec<WorkToken>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Send all tokens, returning how many were taken by workers.
    ///
    /// Dispatch stops early only if every receiver has gone away. The queue
    /// closes when `queue` is dropped at the end of this call.
    pub async fn run(self, queue: flume::Sender<WorkToken>) -> usize {
        let mut dispatched = 0;
        for token in self.tokens {
            if queue.send_async(token).await.is_err() {
                break;
            }
            dispatched += 1;
        }
        dispatched
    }
}
