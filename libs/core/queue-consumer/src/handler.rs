//! Message handler contract and the two reusable handler shapes.
//!
//! A handler receives a batch and must return one [`ProcessedMessage`] per
//! input message, never failing: any processing error (or panic) is
//! converted into `Failed` decorations so the pipeline always gets a
//! verdict for every message.
//!
//! The two standard shapes are adapters over narrow processor traits:
//! [`PerMessageHandler`] fans a single-message processor out over the batch
//! for partial-batch acknowledgment, and [`WholeBatchHandler`] treats the
//! batch as one atomic unit.

use crate::error::BoxError;
use crate::message::{Message, ProcessedMessage};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::warn;

/// Batch handler contract.
///
/// Cardinality-preserving: implementations return exactly one result per
/// input message. Order of the results is not significant.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process a batch and decorate every message with its verdict.
    async fn handle(&self, messages: Vec<Message>) -> Vec<ProcessedMessage>;

    /// Handler name for logging.
    fn name(&self) -> &'static str {
        "handler"
    }
}

/// Processes a single message.
///
/// Return `Ok(())` for success, `Err` for failure. Failures decorate only
/// the message being processed.
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    /// Process one message.
    async fn process(&self, message: &Message) -> Result<(), BoxError>;
}

/// Processes a whole batch atomically.
///
/// A failure marks every message of the batch as failed, so none of them
/// is acknowledged and the queue redelivers the entire batch.
#[async_trait]
pub trait BatchProcessor: Send + Sync {
    /// Process the batch as one unit.
    async fn process_batch(&self, messages: &[Message]) -> Result<(), BoxError>;
}

/// Fans a [`MessageProcessor`] out over the batch, one task per message.
///
/// Each message gets its own verdict, giving partial-batch acknowledgment:
/// messages that fail stay on the queue while the rest are deleted.
pub struct PerMessageHandler<P: MessageProcessor + 'static> {
    processor: Arc<P>,
}

impl<P: MessageProcessor + 'static> PerMessageHandler<P> {
    /// Wrap a processor.
    pub fn new(processor: P) -> Self {
        Self {
            processor: Arc::new(processor),
        }
    }

    /// Wrap an already-shared processor.
    pub fn from_arc(processor: Arc<P>) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl<P: MessageProcessor + 'static> MessageHandler for PerMessageHandler<P> {
    async fn handle(&self, messages: Vec<Message>) -> Vec<ProcessedMessage> {
        let mut tasks = Vec::with_capacity(messages.len());

        for message in messages {
            let processor = Arc::clone(&self.processor);
            // Kept outside the task so a panicking processor still yields
            // a failure verdict for its message.
            let fallback = message.clone();

            let task = tokio::spawn(async move {
                match processor.process(&message).await {
                    Ok(()) => ProcessedMessage::Ok(message),
                    Err(error) => {
                        warn!(message_id = %message.id, error = %error, "error while handling the message");
                        ProcessedMessage::Failed(message)
                    }
                }
            });
            tasks.push((fallback, task));
        }

        join_all(tasks.into_iter().map(|(fallback, task)| async move {
            match task.await {
                Ok(result) => result,
                Err(error) => {
                    warn!(message_id = %fallback.id, error = %error, "message processor panicked");
                    ProcessedMessage::Failed(fallback)
                }
            }
        }))
        .await
    }

    fn name(&self) -> &'static str {
        "per_message"
    }
}

/// Runs a [`BatchProcessor`] over the whole batch as one atomic call.
pub struct WholeBatchHandler<P: BatchProcessor + 'static> {
    processor: Arc<P>,
}

impl<P: BatchProcessor + 'static> WholeBatchHandler<P> {
    /// Wrap a processor.
    pub fn new(processor: P) -> Self {
        Self {
            processor: Arc::new(processor),
        }
    }

    /// Wrap an already-shared processor.
    pub fn from_arc(processor: Arc<P>) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl<P: BatchProcessor + 'static> MessageHandler for WholeBatchHandler<P> {
    async fn handle(&self, messages: Vec<Message>) -> Vec<ProcessedMessage> {
        let processor = Arc::clone(&self.processor);
        let batch = messages.clone();

        let outcome = tokio::spawn(async move { processor.process_batch(&batch).await }).await;

        match outcome {
            Ok(Ok(())) => messages.into_iter().map(ProcessedMessage::Ok).collect(),
            Ok(Err(error)) => {
                warn!(count = messages.len(), error = %error, "error while handling the messages");
                messages.into_iter().map(ProcessedMessage::Failed).collect()
            }
            Err(error) => {
                warn!(count = messages.len(), error = %error, "batch processor panicked");
                messages.into_iter().map(ProcessedMessage::Failed).collect()
            }
        }
    }

    fn name(&self) -> &'static str {
        "whole_batch"
    }
}
