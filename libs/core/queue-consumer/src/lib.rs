//! Queue Consumer Framework
//!
//! A generic consumer engine for pull-based message queues: it polls a
//! queue from parallel workers, hands each batch to a pluggable handler and
//! acknowledges only the messages the handler marked successful, leaving
//! the rest to the queue's own redelivery mechanism.
//!
//! ## Features
//!
//! - **Parallel polling**: one independent long-poll loop per configured worker
//! - **Retry with backoff**: failed receive calls retried with exponential backoff
//! - **Partial-batch acknowledgment**: per-message verdicts decide what gets deleted
//! - **Pluggable handlers**: per-message and whole-batch shapes over one contract
//! - **Metrics**: per-consumer counter registry with on-demand snapshots
//! - **At-least-once**: unacknowledged messages are redelivered by the queue
//!
//! ## Example
//!
//! ```ignore
//! use queue_consumer::{
//!     Consumer, ConsumerConfig, Message, MessageProcessor, PerMessageHandler, QueueConsumer,
//! };
//!
//! // Wrap your queue client in a QueueProvider implementation.
//! let provider = Arc::new(SqsProvider::new(client, queue_url));
//!
//! // Process each message independently; failures stay on the queue.
//! struct OrderProcessor;
//!
//! #[async_trait]
//! impl MessageProcessor for OrderProcessor {
//!     async fn process(&self, message: &Message) -> Result<(), BoxError> {
//!         handle_order(&message.body).await
//!     }
//! }
//!
//! let config = ConsumerConfig::new(queue_url).with_workers(4);
//! let consumer = QueueConsumer::new(
//!     provider,
//!     config,
//!     Arc::new(PerMessageHandler::new(OrderProcessor)),
//! )?;
//!
//! // Later: consumer.metrics().snapshot(), consumer.stop().
//! ```

mod config;
mod consumer;
mod error;
mod handler;
mod helper;
mod message;
pub mod metrics;
mod provider;
mod source;

// Re-export main types
pub use config::ConsumerConfig;
pub use consumer::{Consumer, QueueConsumer};
pub use error::{BoxError, ConsumerError};
pub use handler::{
    BatchProcessor, MessageHandler, MessageProcessor, PerMessageHandler, WholeBatchHandler,
};
pub use message::{DeleteOutcome, Message, ProcessedMessage};
pub use metrics::{ConsumerMetrics, ConsumerMetricsLogger};
pub use provider::QueueProvider;
