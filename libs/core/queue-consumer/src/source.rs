//! Per-worker poll source.
//!
//! Each worker drives one sequential loop: receive a batch (retrying failed
//! calls with exponential backoff), hand non-empty batches downstream, then
//! consult the continuation predicate. Exhausting the retry budget ends the
//! loop with an error; that is fatal for this worker only.

use crate::config::ConsumerConfig;
use crate::error::ConsumerError;
use crate::message::Message;
use crate::metrics::{self, ConsumerMetrics};
use crate::provider::QueueProvider;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) struct PollSource {
    provider: Arc<dyn QueueProvider>,
    config: ConsumerConfig,
    metrics: Arc<ConsumerMetrics>,
}

impl PollSource {
    pub(crate) fn new(
        provider: Arc<dyn QueueProvider>,
        config: ConsumerConfig,
        metrics: Arc<ConsumerMetrics>,
    ) -> Self {
        Self {
            provider,
            config,
            metrics,
        }
    }

    /// One receive call, retried with exponential backoff.
    ///
    /// Waits base-backoff x 2^(attempt-1) before each retry, up to the
    /// configured retry count. With `retries = R`, at most `R + 1` receive
    /// calls are issued before the error escalates.
    pub(crate) async fn poll(&self) -> Result<Vec<Message>, ConsumerError> {
        let mut attempt: u32 = 0;
        loop {
            match self.provider.receive().await {
                Ok(batch) => {
                    self.metrics.increment(metrics::RECEIVE_CALLS);
                    self.metrics.add(metrics::MESSAGES_RECEIVED, batch.len() as u64);
                    debug!(
                        queue = %self.config.queue_url,
                        count = batch.len(),
                        "received messages"
                    );
                    return Ok(batch);
                }
                Err(error) => {
                    let error = ConsumerError::Receive(error);
                    attempt += 1;
                    if attempt > self.config.retries {
                        return Err(ConsumerError::RetriesExhausted {
                            attempts: attempt,
                            source: error.into(),
                        });
                    }

                    let backoff = self.config.retry_backoff() * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        queue = %self.config.queue_url,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %error,
                        "error while requesting messages, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// Run the polling loop.
    ///
    /// Empty batches skip `on_batch` but still complete the iteration. The
    /// continuation predicate is checked after each successful iteration;
    /// when it turns false the loop ends normally without issuing another
    /// receive call.
    pub(crate) async fn run<C, F, Fut>(
        &self,
        worker: usize,
        keep_polling: C,
        mut on_batch: F,
    ) -> Result<(), ConsumerError>
    where
        C: Fn() -> bool,
        F: FnMut(Vec<Message>) -> Fut,
        Fut: Future<Output = ()>,
    {
        debug!(queue = %self.config.queue_url, worker, "starting poll source");

        loop {
            let batch = self.poll().await?;
            if !batch.is_empty() {
                on_batch(batch).await;
            }

            if !keep_polling() {
                debug!(queue = %self.config.queue_url, worker, "poll source stopped");
                return Ok(());
            }
        }
    }
}
