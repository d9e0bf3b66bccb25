//! Consumer lifecycle.
//!
//! `QueueConsumer` owns the worker set for one queue: it validates its
//! configuration eagerly, spawns the pipeline on start, and aborts it on
//! stop. At most one active run per instance; `start` while running is a
//! no-op.

use crate::config::ConsumerConfig;
use crate::error::ConsumerError;
use crate::handler::MessageHandler;
use crate::helper::ConsumerHelper;
use crate::metrics::ConsumerMetrics;
use crate::provider::QueueProvider;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Control and observation surface of a consumer.
///
/// Object-safe so an embedding service can hold heterogeneous consumers
/// behind one collection, e.g. for a shared metrics logger.
pub trait Consumer: Send + Sync {
    /// Start consuming from the source.
    fn start(&self);

    /// Stop consuming from the source.
    fn stop(&self);

    /// The consumer's metrics registry.
    fn metrics(&self) -> Arc<ConsumerMetrics>;

    /// Whether the consumer's pipeline is live.
    fn is_running(&self) -> bool;
}

/// Parallel executor of queue polling workers.
///
/// Spawns its workers on the ambient Tokio runtime, so construction with
/// auto-start, `start` and `stop` must happen inside a runtime.
pub struct QueueConsumer {
    id: String,
    config: ConsumerConfig,
    helper: Arc<ConsumerHelper>,
    metrics: Arc<ConsumerMetrics>,
    running: Arc<AtomicBool>,
    workers: Mutex<Option<JoinSet<Result<(), ConsumerError>>>>,
}

impl QueueConsumer {
    /// Construct a consumer from a provider, its configuration and a
    /// handler.
    ///
    /// The configuration is validated eagerly; a violation fails
    /// construction with the offending field named. When `auto_start` is
    /// set the consumer starts before being returned.
    pub fn new(
        provider: Arc<dyn QueueProvider>,
        config: ConsumerConfig,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Self, ConsumerError> {
        config.validate()?;

        let metrics = Arc::new(ConsumerMetrics::new(format!(
            "{}'s consumer",
            config.queue_url
        )));
        let helper = Arc::new(ConsumerHelper::new(
            provider,
            handler,
            config.clone(),
            Arc::clone(&metrics),
        ));

        let consumer = Self {
            id: format!("consumer-{}", Uuid::new_v4()),
            config,
            helper,
            metrics,
            running: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(None),
        };

        if consumer.config.auto_start {
            consumer.start();
        }

        Ok(consumer)
    }

    /// The consumer's configuration.
    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Unique consumer instance ID, for log correlation.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Consumer for QueueConsumer {
    fn start(&self) {
        let mut workers = self.workers.lock().expect("consumer lock poisoned");
        if workers.is_some() {
            debug!(consumer = %self.id, "start ignored, already running");
            return;
        }

        info!(
            consumer = %self.id,
            queue = %self.config.queue_url,
            workers = self.config.workers,
            "starting to consume"
        );
        self.running.store(true, Ordering::SeqCst);
        *workers = Some(self.helper.spawn_workers(Arc::clone(&self.running)));
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);

        let mut workers = self.workers.lock().expect("consumer lock poisoned");
        if let Some(mut set) = workers.take() {
            // An in-flight long-poll is abandoned rather than awaited; no
            // new iteration starts after this.
            set.abort_all();
            info!(consumer = %self.id, queue = %self.config.queue_url, "stopped consuming");
        }
    }

    fn metrics(&self) -> Arc<ConsumerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Reflects the aggregate pipeline's live/disposed state, not
    /// individual worker health: a worker that died from exhausted retries
    /// does not flip this to false.
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self
                .workers
                .lock()
                .expect("consumer lock poisoned")
                .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::handler::{MessageProcessor, PerMessageHandler};
    use crate::message::{DeleteOutcome, Message};
    use crate::metrics;
    use crate::provider::MockQueueProvider;
    use async_trait::async_trait;
    use std::time::Duration;

    struct AlwaysOk;

    #[async_trait]
    impl MessageProcessor for AlwaysOk {
        async fn process(&self, _message: &Message) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn handler() -> Arc<PerMessageHandler<AlwaysOk>> {
        Arc::new(PerMessageHandler::new(AlwaysOk))
    }

    fn idle_provider() -> Arc<MockQueueProvider> {
        let mut provider = MockQueueProvider::new();
        provider.expect_receive().returning(|| Ok(Vec::new()));
        Arc::new(provider)
    }

    fn manual_config() -> ConsumerConfig {
        ConsumerConfig::new("https://queue/test")
            .with_workers(2)
            .with_auto_start(false)
    }

    #[tokio::test]
    async fn test_invalid_config_fails_construction() {
        let config = ConsumerConfig::new("https://queue/test").with_max_messages(11);
        let result = QueueConsumer::new(idle_provider(), config, handler());

        match result {
            Err(error) => assert_eq!(error.config_field(), Some("max_messages")),
            Ok(_) => panic!("construction should fail eagerly"),
        }
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let consumer = QueueConsumer::new(idle_provider(), manual_config(), handler())
            .expect("valid config");

        assert!(!consumer.is_running());

        consumer.start();
        assert!(consumer.is_running());

        consumer.stop();
        assert!(!consumer.is_running());

        // Restartable after a stop.
        consumer.start();
        assert!(consumer.is_running());
        consumer.stop();
    }

    #[tokio::test]
    async fn test_start_while_running_is_noop() {
        let consumer = QueueConsumer::new(idle_provider(), manual_config(), handler())
            .expect("valid config");

        consumer.start();
        consumer.start();
        assert!(consumer.is_running());

        // One stop is enough; no second worker set was spawned.
        consumer.stop();
        assert!(!consumer.is_running());
    }

    #[tokio::test]
    async fn test_auto_start() {
        let config = ConsumerConfig::new("https://queue/test").with_workers(1);
        assert!(config.auto_start);

        let consumer =
            QueueConsumer::new(idle_provider(), config, handler()).expect("valid config");

        assert!(consumer.is_running());
        consumer.stop();
    }

    /// Provider that serves a fixed number of two-message batches, then
    /// parks in the long-poll forever. Parking lets paused time advance
    /// once every served batch has been fully processed.
    struct BoundedProvider {
        remaining_calls: usize,
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl QueueProvider for BoundedProvider {
        async fn receive(&self) -> Result<Vec<Message>, BoxError> {
            let call = self
                .calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if call < self.remaining_calls {
                Ok(vec![
                    Message::new("a", "rh-a", ""),
                    Message::new("b", "rh-b", ""),
                ])
            } else {
                futures::future::pending().await
            }
        }

        async fn delete(&self, messages: Vec<Message>) -> Result<DeleteOutcome, BoxError> {
            Ok(DeleteOutcome::all(&messages))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pipeline_consumes_and_acknowledges() {
        let provider = Arc::new(BoundedProvider {
            remaining_calls: 8,
            calls: std::sync::atomic::AtomicUsize::new(0),
        });

        let config = ConsumerConfig::new("https://queue/orders")
            .with_workers(4)
            .with_auto_start(false);
        let consumer =
            QueueConsumer::new(provider, config, handler()).expect("valid config");

        consumer.start();
        // Every served batch is handled and acknowledged before the workers
        // all park in the empty long-poll and time can advance.
        tokio::time::sleep(Duration::from_millis(50)).await;
        consumer.stop();

        let snapshot = consumer.metrics().snapshot();
        assert_eq!(snapshot.get(metrics::RECEIVE_CALLS), Some(&8));
        assert_eq!(snapshot.get(metrics::MESSAGES_RECEIVED), Some(&16));
        assert_eq!(snapshot.get(metrics::MESSAGES_DELETED), Some(&16));
    }

    #[tokio::test]
    async fn test_dead_workers_do_not_flip_running_state() {
        let mut provider = MockQueueProvider::new();
        provider
            .expect_receive()
            .returning(|| Err("connection reset".into()));

        let config = manual_config().with_retries(0);
        let consumer = QueueConsumer::new(Arc::new(provider), config, handler())
            .expect("valid config");

        consumer.start();
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        // Both workers exhaust their retries immediately; the aggregate
        // still reports running until an explicit stop.
        assert!(consumer.is_running());
        assert_eq!(consumer.metrics().get(metrics::RECEIVE_CALLS), 0);

        consumer.stop();
        assert!(!consumer.is_running());
    }

    #[tokio::test]
    async fn test_metrics_logger_runs_over_consumers() {
        let consumer = Arc::new(
            QueueConsumer::new(idle_provider(), manual_config(), handler())
                .expect("valid config"),
        );
        consumer.metrics().add(metrics::MESSAGES_RECEIVED, 3);

        let logger =
            metrics::ConsumerMetricsLogger::new(vec![consumer.clone() as Arc<dyn Consumer>]);
        logger.run();

        assert_eq!(consumer.metrics().get(metrics::MESSAGES_RECEIVED), 3);
    }
}
