//! Pipeline counters.
//!
//! Every non-fatal failure in the pipeline is counted here in addition to
//! being logged. Queue evictions are tracked by the queue itself and folded
//! into [`StatsSnapshot`] when a snapshot is taken.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::queue::DropOldestQueue;

/// Cumulative counters shared by the producer and consumer tasks.
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Poll cycles started.
    cycles: AtomicU64,
    /// Successful register reads.
    reads_ok: AtomicU64,
    /// Failed register reads.
    reads_failed: AtomicU64,
    /// Cycles where every read failed.
    empty_cycles: AtomicU64,
    /// Batches handed to the queue.
    batches_enqueued: AtomicU64,
    /// Batches sent successfully.
    batches_sent: AtomicU64,
    /// Send attempts that failed.
    sends_failed: AtomicU64,
}

/// Point-in-time view of the pipeline, suitable for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub cycles: u64,
    pub reads_ok: u64,
    pub reads_failed: u64,
    pub empty_cycles: u64,
    pub batches_enqueued: u64,
    pub batches_sent: u64,
    pub sends_failed: u64,
    /// Batches waiting in the queue.
    pub queued: usize,
    /// Batches evicted by the queue since startup.
    pub dropped: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_ok(&self) {
        self.reads_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_failed(&self) {
        self.reads_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty_cycle(&self) {
        self.empty_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_enqueued(&self) {
        self.batches_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_failed(&self) {
        self.sends_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters together with the queue's current state.
    pub fn snapshot<T>(&self, queue: &DropOldestQueue<T>) -> StatsSnapshot {
        StatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            reads_ok: self.reads_ok.load(Ordering::Relaxed),
            reads_failed: self.reads_failed.load(Ordering::Relaxed),
            empty_cycles: self.empty_cycles.load(Ordering::Relaxed),
            batches_enqueued: self.batches_enqueued.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            sends_failed: self.sends_failed.load(Ordering::Relaxed),
            queued: queue.len(),
            dropped: queue.dropped_count(),
        }
    }
}
