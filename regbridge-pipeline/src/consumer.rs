//! Send consumer: drains the queue and forwards each batch once.

use std::sync::Arc;
use std::time::Duration;

use regbridge_common::MeasurementBatch;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::error::TransportError;
use crate::queue::DropOldestQueue;
use crate::stats::PipelineStats;
use crate::transport::DatagramSender;

/// Default bound on one wait for the next batch.
pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(100);

/// Owns the datagram sender and empties the queue.
pub struct SendConsumer<S> {
    sender: S,
    queue: Arc<DropOldestQueue<MeasurementBatch>>,
    stats: Arc<PipelineStats>,
    idle_wait: Duration,
}

impl<S: DatagramSender> SendConsumer<S> {
    pub fn new(
        sender: S,
        queue: Arc<DropOldestQueue<MeasurementBatch>>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            sender,
            queue,
            stats,
            idle_wait: DEFAULT_IDLE_WAIT,
        }
    }

    /// Longest time to wait on an empty queue before re-checking the stop flag.
    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    /// Encode and send one batch. The batch is consumed either way.
    pub async fn forward(&mut self, batch: MeasurementBatch) -> Result<(), TransportError> {
        let payload = batch.to_bytes();

        match self.sender.send(&payload).await {
            Ok(()) => {
                self.stats.record_sent();
                debug!(
                    timestamp = batch.timestamp,
                    bytes = payload.len(),
                    "Batch sent"
                );
                Ok(())
            }
            Err(e) => {
                self.stats.record_send_failed();
                Err(e)
            }
        }
    }

    /// Forward batches until `stop` turns true.
    ///
    /// The stop flag is checked before each drain attempt; an in-flight send
    /// always completes. Batches still queued at stop are left in the queue.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> S {
        info!(
            idle_wait_ms = self.idle_wait.as_millis() as u64,
            "Starting send consumer"
        );

        while !*stop.borrow_and_update() {
            match self.queue.pop_timeout(self.idle_wait).await {
                Some(batch) => {
                    let timestamp = batch.timestamp;
                    if let Err(e) = self.forward(batch).await {
                        warn!(timestamp, error = %e, "Failed to send batch, dropping it");
                    }
                }
                None => trace!("Queue empty"),
            }
        }

        info!(remaining = self.queue.len(), "Send consumer stopped");
        self.sender
    }
}
