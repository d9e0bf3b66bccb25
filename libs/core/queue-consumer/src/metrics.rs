//! Consumer metrics registry
//!
//! Named counters shared by every worker of one consumer. Counters are
//! plain atomics behind a read-mostly map: the write lock is taken only the
//! first time a metric name is seen, so concurrent workers incrementing
//! existing counters never contend on a lock.
//!
//! Every update is also recorded through the `metrics` facade, so an
//! embedding service with a Prometheus (or other) recorder installed gets
//! the same counters exported for free.

use chrono::{DateTime, Utc};
use metrics::counter;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use crate::consumer::Consumer;
use std::sync::Arc;

/// Counter for receive API calls that completed successfully.
pub const RECEIVE_CALLS: &str = "receive_calls";

/// Counter for messages received across all workers.
pub const MESSAGES_RECEIVED: &str = "messages_received";

/// Counter for messages acknowledged (deleted) after processing.
pub const MESSAGES_DELETED: &str = "messages_deleted";

/// Name of the facade counter mirrored for every registry update.
const FACADE_COUNTER: &str = "queue_consumer_events_total";

/// Thread-safe registry of named, monotonically-increasing counters.
///
/// Created once per consumer; mutated concurrently by all of its workers;
/// snapshotted on demand without resetting.
pub struct ConsumerMetrics {
    name: String,
    started_at: DateTime<Utc>,
    counters: RwLock<HashMap<String, AtomicU64>>,
}

impl ConsumerMetrics {
    /// Create a registry with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started_at: Utc::now(),
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Registry name, used as the `consumer` label on exported counters.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the registry was created.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Add 1 to the named counter, creating it at 0 if absent.
    pub fn increment(&self, metric: &str) {
        self.add(metric, 1);
    }

    /// Add `value` to the named counter, creating it at 0 if absent.
    pub fn add(&self, metric: &str, value: u64) {
        let existing = {
            let counters = self.counters.read().expect("metrics lock poisoned");
            if let Some(existing) = counters.get(metric) {
                existing.fetch_add(value, Ordering::Relaxed);
                true
            } else {
                false
            }
        };

        if !existing {
            let mut counters = self.counters.write().expect("metrics lock poisoned");
            counters
                .entry(metric.to_string())
                .or_insert_with(|| AtomicU64::new(0))
                .fetch_add(value, Ordering::Relaxed);
        }

        counter!(
            FACADE_COUNTER,
            "consumer" => self.name.clone(),
            "metric" => metric.to_string()
        )
        .increment(value);
    }

    /// Current value of one counter, 0 if it was never touched.
    pub fn get(&self, metric: &str) -> u64 {
        let counters = self.counters.read().expect("metrics lock poisoned");
        counters
            .get(metric)
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// A consistent view of every counter's current value.
    ///
    /// Does not reset anything and does not block writers incrementing
    /// existing counters; only the creation of a brand-new counter waits.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        let counters = self.counters.read().expect("metrics lock poisoned");
        counters
            .iter()
            .map(|(name, counter)| (name.clone(), counter.load(Ordering::Relaxed)))
            .collect()
    }

    /// Log the accumulated metrics at info level.
    pub fn log(&self) {
        info!(
            name = %self.name,
            since = %self.started_at,
            metrics = ?self.snapshot(),
            "consumer metrics"
        );
    }
}

/// Logs the metrics of a set of consumers on each [`run`](Self::run) call.
///
/// Scheduling is up to the embedding service; a periodic task calling
/// `run()` is the typical setup.
pub struct ConsumerMetricsLogger {
    consumers: Vec<Arc<dyn Consumer>>,
}

impl ConsumerMetricsLogger {
    /// Create the logger for the given consumers.
    pub fn new(consumers: Vec<Arc<dyn Consumer>>) -> Self {
        Self { consumers }
    }

    /// Log every consumer's metrics snapshot.
    pub fn run(&self) {
        for consumer in &self.consumers {
            consumer.metrics().log();
        }
    }
}
