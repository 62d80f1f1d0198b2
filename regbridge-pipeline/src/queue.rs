//! Bounded queue that evicts its oldest entry on overflow.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

/// Default queue capacity.
pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded FIFO shared between the producer and the consumer.
///
/// `push` never blocks: at capacity it evicts the head before appending and
/// bumps the dropped counter, both under the same lock. `pop` suspends the
/// caller until an item is available.
#[derive(Debug)]
pub struct DropOldestQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
    dropped: AtomicU64,
    available: Notify,
}

impl<T> DropOldestQueue<T> {
    /// Create a queue holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicU64::new(0),
            available: Notify::new(),
        }
    }

    /// Create a queue with [`DEFAULT_CAPACITY`].
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        // A panic while holding the lock cannot leave the deque inconsistent.
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item, evicting and returning the oldest one if full.
    pub fn push(&self, item: T) -> Option<T> {
        let evicted = {
            let mut items = self.lock();
            let evicted = if items.len() >= self.capacity {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                items.pop_front()
            } else {
                None
            };
            items.push_back(item);
            evicted
        };
        self.available.notify_one();
        evicted
    }

    /// Remove the oldest item without waiting.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Remove the oldest item, waiting until one is pushed if empty.
    ///
    /// Cancel safe: an item is only taken out of the queue when the
    /// returned future completes.
    pub async fn pop(&self) -> T {
        loop {
            let notified = self.available.notified();
            if let Some(item) = self.try_pop() {
                return item;
            }
            notified.await;
        }
    }

    /// Like [`pop`](Self::pop), but gives up after `timeout`.
    pub async fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        tokio::time::timeout(timeout, self.pop()).await.ok()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items evicted since creation. Never reset.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T> Default for DropOldestQueue<T> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
