//! Message and processing-result types.
//!
//! The engine never inspects a message body. It only needs the ID and the
//! receipt handle to request deletion after processing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An opaque unit fetched from the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Queue-assigned message ID.
    pub id: String,

    /// Opaque acknowledgment token; required to delete the message.
    pub receipt_handle: String,

    /// Raw message body. Opaque to the engine.
    pub body: String,

    /// Opaque transport attributes.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Message {
    /// Create a new message.
    pub fn new(
        id: impl Into<String>,
        receipt_handle: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            receipt_handle: receipt_handle.into(),
            body: body.into(),
            attributes: HashMap::new(),
        }
    }

    /// Attach a transport attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A message paired with its processing verdict.
///
/// Produced exactly once per message per handler pass. The deletion filter
/// matches on the variants, so a new verdict cannot be added without the
/// filter being updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessedMessage {
    /// The message was processed successfully and may be acknowledged.
    Ok(Message),
    /// Processing failed; the message is left for redelivery.
    Failed(Message),
}

impl ProcessedMessage {
    /// The decorated message, regardless of verdict.
    pub fn message(&self) -> &Message {
        match self {
            Self::Ok(message) | Self::Failed(message) => message,
        }
    }

    /// Whether processing succeeded.
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Unwrap the message when processing succeeded.
    pub fn into_successful(self) -> Option<Message> {
        match self {
            Self::Ok(message) => Some(message),
            Self::Failed(_) => None,
        }
    }
}

/// Result of a batched delete call.
///
/// Partial success within one call is possible; the engine counts the
/// successful subset and leaves the rejected subset to redelivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// IDs of messages the queue confirmed deleted.
    pub successful: Vec<String>,

    /// IDs of messages the queue rejected.
    pub failed: Vec<String>,
}

impl DeleteOutcome {
    /// Outcome reporting every given message as deleted.
    pub fn all(messages: &[Message]) -> Self {
        Self {
            successful: messages.iter().map(|m| m.id.clone()).collect(),
            failed: Vec::new(),
        }
    }
}
