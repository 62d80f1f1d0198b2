//! Pipeline lifecycle: start both tasks, stop them in order.

use std::sync::Arc;
use std::time::Duration;

use regbridge_common::{MeasurementBatch, RegisterDescriptor};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::consumer::{DEFAULT_IDLE_WAIT, SendConsumer};
use crate::error::{BridgeError, Result};
use crate::producer::{DEFAULT_POLL_INTERVAL, DEFAULT_REGISTER_DELAY, PollProducer};
use crate::queue::{DEFAULT_CAPACITY, DropOldestQueue};
use crate::stats::{PipelineStats, StatsSnapshot};
use crate::transport::{DatagramSender, RegisterReader};

/// Timing and sizing knobs for the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Wait between poll cycles, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Pause between consecutive register reads, in milliseconds.
    #[serde(default = "default_register_delay_ms")]
    pub register_delay_ms: u64,

    /// Longest consumer wait on an empty queue, in milliseconds.
    #[serde(default = "default_idle_wait_ms")]
    pub idle_wait_ms: u64,

    /// Maximum number of batches held before the oldest is dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_register_delay_ms() -> u64 {
    DEFAULT_REGISTER_DELAY.as_millis() as u64
}

fn default_idle_wait_ms() -> u64 {
    DEFAULT_IDLE_WAIT.as_millis() as u64
}

fn default_queue_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            register_delay_ms: default_register_delay_ms(),
            idle_wait_ms: default_idle_wait_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl PipelineSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn register_delay(&self) -> Duration {
        Duration::from_millis(self.register_delay_ms)
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    /// Check the settings for values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(BridgeError::validation(
                "poll_interval_ms must be greater than 0",
            ));
        }
        if self.idle_wait_ms == 0 {
            return Err(BridgeError::validation(
                "idle_wait_ms must be greater than 0",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(BridgeError::validation(
                "queue_capacity must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// A running producer/consumer pair sharing one drop-oldest queue.
///
/// # Example
///
/// ```ignore
/// let pipeline = Pipeline::start(registers, &settings, reader, sender);
/// wait_for_shutdown_signal().await?;
/// let report = pipeline.shutdown().await?;
/// ```
pub struct Pipeline {
    queue: Arc<DropOldestQueue<MeasurementBatch>>,
    stats: Arc<PipelineStats>,
    producer_stop: watch::Sender<bool>,
    consumer_stop: watch::Sender<bool>,
    producer: JoinHandle<()>,
    consumer: JoinHandle<()>,
}

impl Pipeline {
    /// Spawn the producer and consumer tasks on the current tokio runtime.
    ///
    /// The reader moves into the producer task and the sender into the
    /// consumer task; neither task can reach the other's transport.
    pub fn start<R, S>(
        registers: Vec<RegisterDescriptor>,
        settings: &PipelineSettings,
        reader: R,
        sender: S,
    ) -> Self
    where
        R: RegisterReader + 'static,
        S: DatagramSender + 'static,
    {
        let queue = Arc::new(DropOldestQueue::new(settings.queue_capacity));
        let stats = Arc::new(PipelineStats::new());

        let (producer_stop, producer_rx) = watch::channel(false);
        let (consumer_stop, consumer_rx) = watch::channel(false);

        let producer = PollProducer::new(registers, reader, queue.clone(), stats.clone())
            .with_poll_interval(settings.poll_interval())
            .with_register_delay(settings.register_delay());
        let consumer = SendConsumer::new(sender, queue.clone(), stats.clone())
            .with_idle_wait(settings.idle_wait());

        let producer = tokio::spawn(async move {
            producer.run(producer_rx).await;
        });
        let consumer = tokio::spawn(async move {
            consumer.run(consumer_rx).await;
        });

        tracing::info!(
            capacity = queue.capacity(),
            "Pipeline started"
        );

        Self {
            queue,
            stats,
            producer_stop,
            consumer_stop,
            producer,
            consumer,
        }
    }

    /// The shared queue.
    pub fn queue(&self) -> &Arc<DropOldestQueue<MeasurementBatch>> {
        &self.queue
    }

    /// Current counters and queue state.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(&self.queue)
    }

    /// Stop the producer, wait for it, then stop the consumer and wait for it.
    ///
    /// The consumer keeps draining while the producer finishes its last
    /// cycle. Batches still queued afterwards are discarded; their count is
    /// in the returned snapshot.
    pub async fn shutdown(self) -> Result<StatsSnapshot> {
        tracing::info!("Stopping poll producer");
        let _ = self.producer_stop.send(true);
        let producer = self.producer.await;

        tracing::info!("Stopping send consumer");
        let _ = self.consumer_stop.send(true);
        let consumer = self.consumer.await;

        let snapshot = self.stats.snapshot(&self.queue);
        tracing::info!(
            queued = snapshot.queued,
            dropped = snapshot.dropped,
            sent = snapshot.batches_sent,
            send_failures = snapshot.sends_failed,
            read_failures = snapshot.reads_failed,
            "Pipeline stopped"
        );

        producer.map_err(|e| BridgeError::worker(format!("poll producer: {}", e)))?;
        consumer.map_err(|e| BridgeError::worker(format!("send consumer: {}", e)))?;

        Ok(snapshot)
    }
}

/// Wait for Ctrl+C, or SIGTERM on unix.
pub async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Received Ctrl+C");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Received Ctrl+C");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ConstReader;

    impl RegisterReader for ConstReader {
        async fn read_register(&mut self, address: u16) -> std::result::Result<u16, TransportError> {
            Ok(address)
        }
    }

    struct CountingSender(Arc<AtomicUsize>);

    impl DatagramSender for CountingSender {
        async fn send(&mut self, _payload: &[u8]) -> std::result::Result<(), TransportError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fast_settings() -> PipelineSettings {
        PipelineSettings {
            poll_interval_ms: 5,
            register_delay_ms: 0,
            idle_wait_ms: 5,
            queue_capacity: 10,
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.poll_interval(), Duration::from_millis(1000));
        assert_eq!(settings.register_delay(), Duration::from_millis(300));
        assert_eq!(settings.idle_wait(), Duration::from_millis(100));
        assert_eq!(settings.queue_capacity, 100);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let settings = PipelineSettings {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(BridgeError::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let settings = PipelineSettings {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let sends = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::start(
            vec![RegisterDescriptor::new(1, "a")],
            &fast_settings(),
            ConstReader,
            CountingSender(sends.clone()),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        let snapshot = pipeline.shutdown().await.unwrap();

        assert!(snapshot.cycles > 0);
        assert_eq!(snapshot.batches_sent as usize, sends.load(Ordering::SeqCst));
        assert_eq!(
            snapshot.batches_enqueued,
            snapshot.batches_sent + snapshot.queued as u64 + snapshot.dropped
        );
    }

    #[tokio::test]
    async fn test_shutdown_with_no_registers_does_not_hang() {
        let sends = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::start(
            Vec::new(),
            &fast_settings(),
            ConstReader,
            CountingSender(sends.clone()),
        );

        let snapshot = tokio::time::timeout(Duration::from_secs(1), pipeline.shutdown())
            .await
            .expect("shutdown deadlocked")
            .unwrap();

        assert_eq!(snapshot.queued, 0);
        assert_eq!(sends.load(Ordering::SeqCst), 0);
    }
}
