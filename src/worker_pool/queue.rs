//! Bounded multi-producer queue used for both the input and output sides of
//! the worker pool.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

const RETRY_BACKOFFS_MS: [u64; 3] = [10, 20, 40];

pub struct BoundedQueue<T> {
    capacity: usize,
    items: Mutex<VecDeque<T>>,
    not_empty: Notify,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            not_empty: Notify::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails immediately if the queue is at capacity.
    pub fn put_nowait(&self, item: T) -> Result<(), T> {
        let mut items = self.items.lock();
        if items.len() >= self.capacity {
            return Err(item);
        }
        items.push_back(item);
        drop(items);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Up to 3 attempts with exponential backoff (10ms, 20ms, 40ms). Returns
    /// `false` only after every attempt is exhausted; callers must treat that
    /// as an error, never a silent drop.
    pub async fn put_with_retry(&self, mut item: T) -> bool {
        for backoff_ms in RETRY_BACKOFFS_MS {
            match self.put_nowait(item) {
                Ok(()) => return true,
                Err(rejected) => {
                    item = rejected;
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
        self.put_nowait(item).is_ok()
    }

    /// Succeeds only if every item is accepted; on partial failure the
    /// rejected remainder is returned to the caller for retry.
    pub fn put_bulk(&self, mut batch: Vec<T>) -> Result<(), Vec<T>> {
        let mut items = self.items.lock();
        let available = self.capacity.saturating_sub(items.len());
        if batch.len() > available {
            return Err(batch);
        }
        items.extend(batch.drain(..));
        drop(items);
        self.not_empty.notify_waiters();
        Ok(())
    }

    fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Blocks up to `timeout`, then returns `None` if nothing arrived.
    pub async fn get_with_timeout(&self, timeout: Duration) -> Option<T> {
        if let Some(item) = self.try_pop() {
            return Some(item);
        }
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.not_empty.notified();
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return self.try_pop();
            }
            tokio::select! {
                _ = notified => {
                    if let Some(item) = self.try_pop() {
                        return Some(item);
                    }
                }
                _ = tokio::time::sleep(remaining) => {
                    return self.try_pop();
                }
            }
        }
    }

    /// Drains up to `max` items immediately available, without waiting.
    pub fn pop_bulk(&self, max: usize) -> Vec<T> {
        let mut items = self.items.lock();
        let n = max.min(items.len());
        items.drain(..n).collect()
    }
}
