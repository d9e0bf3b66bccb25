//! Consumer pipeline helper.
//!
//! Composes one poll source per configured worker into the aggregate
//! pipeline: batches stream into the handler, successful messages are
//! filtered out of the decorated results and deleted in one batched
//! acknowledgment per batch. A delete failure is logged and absorbed; it
//! never stops the pipeline or other workers.

use crate::config::ConsumerConfig;
use crate::error::ConsumerError;
use crate::handler::MessageHandler;
use crate::message::{Message, ProcessedMessage};
use crate::metrics::{self, ConsumerMetrics};
use crate::provider::QueueProvider;
use crate::source::PollSource;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinSet;
use tracing::{debug, error};

pub(crate) struct ConsumerHelper {
    provider: Arc<dyn QueueProvider>,
    handler: Arc<dyn MessageHandler>,
    config: ConsumerConfig,
    metrics: Arc<ConsumerMetrics>,
}

impl ConsumerHelper {
    pub(crate) fn new(
        provider: Arc<dyn QueueProvider>,
        handler: Arc<dyn MessageHandler>,
        config: ConsumerConfig,
        metrics: Arc<ConsumerMetrics>,
    ) -> Self {
        Self {
            provider,
            handler,
            config,
            metrics,
        }
    }

    /// Spawn one poll source loop per configured worker.
    ///
    /// Every worker shares the `running` flag as its continuation predicate
    /// and processes its own batches inline, so within a worker iterations
    /// stay strictly sequential while workers interleave freely. A worker
    /// that exhausts its receive retries terminates alone; the returned
    /// `JoinSet` keeps the others running and aborts everything on drop.
    pub(crate) fn spawn_workers(
        self: &Arc<Self>,
        running: Arc<AtomicBool>,
    ) -> JoinSet<Result<(), ConsumerError>> {
        let mut workers = JoinSet::new();

        for worker in 0..self.config.workers {
            let helper = Arc::clone(self);
            let running = Arc::clone(&running);

            workers.spawn(async move {
                let source = PollSource::new(
                    Arc::clone(&helper.provider),
                    helper.config.clone(),
                    Arc::clone(&helper.metrics),
                );

                let result = source
                    .run(
                        worker,
                        || running.load(Ordering::SeqCst),
                        |batch| helper.process_batch(batch),
                    )
                    .await;

                if let Err(ref err) = result {
                    error!(
                        queue = %helper.config.queue_url,
                        worker,
                        error = %err,
                        "worker terminated"
                    );
                }
                result
            });
        }

        workers
    }

    /// Pipe one batch through the handler and acknowledge the successes.
    pub(crate) async fn process_batch(&self, batch: Vec<Message>) {
        let results = self.handler.handle(batch).await;
        let successful: Vec<Message> = results
            .into_iter()
            .filter_map(ProcessedMessage::into_successful)
            .collect();

        if successful.is_empty() {
            return;
        }

        match self.provider.delete(successful).await {
            Ok(outcome) => {
                self.metrics
                    .add(metrics::MESSAGES_DELETED, outcome.successful.len() as u64);
                debug!(
                    queue = %self.config.queue_url,
                    deleted = outcome.successful.len(),
                    rejected = outcome.failed.len(),
                    "messages deleted in batch after processing"
                );
            }
            Err(err) => {
                let err = ConsumerError::Delete(err);
                error!(
                    queue = %self.config.queue_url,
                    error = %err,
                    "an unexpected error occurred while deleting messages in batch"
                );
            }
        }
    }
}
