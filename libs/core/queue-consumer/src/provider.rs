//! Queue provider trait
//!
//! The adapter boundary to the concrete queue transport. Implementations
//! wrap the actual network client (SQS, a broker SDK, an in-memory queue in
//! tests) and must be safe for concurrent use by all workers.

use crate::error::BoxError;
use crate::message::{DeleteOutcome, Message};
use async_trait::async_trait;

/// Receive and delete operations against the queue transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueProvider: Send + Sync {
    /// Fetch up to the configured maximum number of messages, long-polling
    /// up to the configured wait time. May return an empty batch.
    async fn receive(&self) -> Result<Vec<Message>, BoxError>;

    /// Delete the given messages in one batched acknowledgment request.
    ///
    /// Partial success within a call is surfaced through the outcome; the
    /// engine counts the successful subset and does not retry the rest.
    async fn delete(&self, messages: Vec<Message>) -> Result<DeleteOutcome, BoxError>;
}
