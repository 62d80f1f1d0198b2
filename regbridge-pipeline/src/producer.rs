//! Poll producer: reads every configured register once per cycle.

use std::sync::Arc;
use std::time::Duration;

use regbridge_common::{MeasurementBatch, RegisterDescriptor, decode};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::queue::DropOldestQueue;
use crate::stats::PipelineStats;
use crate::transport::RegisterReader;

/// Default wait between the end of one cycle and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Default pause between consecutive register reads.
pub const DEFAULT_REGISTER_DELAY: Duration = Duration::from_millis(300);

/// Result of a single poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A batch with `values` entries was enqueued.
    Enqueued { values: usize, failures: usize },
    /// Every read failed; nothing was enqueued.
    Empty { failures: usize },
}

/// Owns the register reader and feeds the queue.
pub struct PollProducer<R> {
    registers: Vec<RegisterDescriptor>,
    reader: R,
    queue: Arc<DropOldestQueue<MeasurementBatch>>,
    stats: Arc<PipelineStats>,
    poll_interval: Duration,
    register_delay: Duration,
}

impl<R: RegisterReader> PollProducer<R> {
    pub fn new(
        registers: Vec<RegisterDescriptor>,
        reader: R,
        queue: Arc<DropOldestQueue<MeasurementBatch>>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            registers,
            reader,
            queue,
            stats,
            poll_interval: DEFAULT_POLL_INTERVAL,
            register_delay: DEFAULT_REGISTER_DELAY,
        }
    }

    /// Time to wait after a cycle before starting the next one.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Pause inserted between consecutive register reads.
    pub fn with_register_delay(mut self, delay: Duration) -> Self {
        self.register_delay = delay;
        self
    }

    /// Perform a single poll cycle.
    ///
    /// Reads run strictly one after another in configured order. A failed read
    /// only drops that register from the batch.
    pub async fn poll_once(&mut self) -> CycleOutcome {
        self.stats.record_cycle();
        let mut batch = MeasurementBatch::new();
        let mut failures = 0;

        for (index, register) in self.registers.iter().enumerate() {
            if index > 0 && !self.register_delay.is_zero() {
                tokio::time::sleep(self.register_delay).await;
            }

            match self.reader.read_register(register.address).await {
                Ok(raw) => {
                    let value = decode(raw, register);
                    debug!(register = %register.name, raw, value, "Read register");
                    batch.insert(register.name.clone(), value);
                    self.stats.record_read_ok();
                }
                Err(e) => {
                    warn!(
                        register = %register.name,
                        address = register.address,
                        error = %e,
                        "Failed to read register"
                    );
                    failures += 1;
                    self.stats.record_read_failed();
                }
            }
        }

        if batch.is_empty() {
            warn!(
                registers = self.registers.len(),
                "Every register read failed, discarding cycle"
            );
            self.stats.record_empty_cycle();
            return CycleOutcome::Empty { failures };
        }

        let values = batch.len();
        if let Some(evicted) = self.queue.push(batch) {
            debug!(timestamp = evicted.timestamp, "Queue full, evicted oldest batch");
        }
        self.stats.record_enqueued();
        debug!(
            values,
            failures,
            queued = self.queue.len(),
            "Batch enqueued"
        );

        CycleOutcome::Enqueued { values, failures }
    }

    /// Run poll cycles until `stop` turns true.
    ///
    /// The stop flag is checked before each cycle; a running cycle always
    /// completes. Returns the reader so the caller can close it.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> R {
        info!(
            registers = self.registers.len(),
            interval_ms = self.poll_interval.as_millis() as u64,
            "Starting poll producer"
        );

        while !*stop.borrow_and_update() {
            self.poll_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        // Sender dropped.
                        break;
                    }
                }
            }
        }

        info!("Poll producer stopped");
        self.reader
    }
}
