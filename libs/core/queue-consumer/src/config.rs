//! Consumer configuration
//!
//! This module provides `ConsumerConfig` for configuring the queue consumer.
//! Every field is validated together by [`ConsumerConfig::validate`] before a
//! consumer is constructed; a violation names the offending field.

use crate::error::ConsumerError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the queue consumer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Queue identifier (URL or name, as the provider expects it)
    pub queue_url: String,

    /// Maximum messages fetched per receive call (1-10)
    pub max_messages: u32,

    /// Long-poll wait time per receive call, in seconds (1-20)
    pub wait_time_secs: u64,

    /// Number of retries after a failed receive call
    pub retries: u32,

    /// Base backoff between receive retries, in milliseconds
    pub retry_backoff_ms: u64,

    /// Number of parallel polling workers (>= 1)
    pub workers: usize,

    /// Start consuming as soon as the consumer is constructed
    pub auto_start: bool,
}

impl ConsumerConfig {
    /// Create a config for the given queue with default values:
    /// max_messages = 10, wait_time_secs = 20, retries = 3,
    /// retry_backoff_ms = 8000, workers = 4 and auto_start = true.
    pub fn new(queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            max_messages: 10,
            wait_time_secs: 20,
            retries: 3,
            retry_backoff_ms: 8000,
            workers: 4,
            auto_start: true,
        }
    }

    /// Set the maximum messages per receive call
    pub fn with_max_messages(mut self, max_messages: u32) -> Self {
        self.max_messages = max_messages;
        self
    }

    /// Set the long-poll wait time in seconds
    pub fn with_wait_time_secs(mut self, wait_time_secs: u64) -> Self {
        self.wait_time_secs = wait_time_secs;
        self
    }

    /// Set the receive retry count
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the base retry backoff in milliseconds
    pub fn with_retry_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.retry_backoff_ms = backoff_ms;
        self
    }

    /// Set the number of parallel workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Enable or disable auto-start
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Base retry backoff as a [`Duration`]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Long-poll wait time as a [`Duration`]
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs)
    }

    /// Check all fields, failing with the name of the first violated one.
    ///
    /// Rules:
    /// - queue_url must not be blank;
    /// - max_messages must be between 1 and 10;
    /// - wait_time_secs must be between 1 and 20;
    /// - workers must be at least 1.
    ///
    /// `retries` and `retry_backoff_ms` are unsigned, so their lower bound
    /// of zero holds by construction.
    pub fn validate(&self) -> Result<(), ConsumerError> {
        if self.queue_url.trim().is_empty() {
            return Err(ConsumerError::config("queue_url", "must have value"));
        }
        if !(1..=10).contains(&self.max_messages) {
            return Err(ConsumerError::config("max_messages", "must be between 1 and 10"));
        }
        if !(1..=20).contains(&self.wait_time_secs) {
            return Err(ConsumerError::config("wait_time_secs", "must be between 1 and 20"));
        }
        if self.workers < 1 {
            return Err(ConsumerError::config("workers", "must be at least 1"));
        }
        Ok(())
    }
}
