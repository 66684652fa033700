//! Bounded FIFO work queue with a single producer and any number of consumers.

use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

const LOG_TARGET: &str = "     queue";

/// Default number of items the queue buffers before the producer blocks
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Create a queue holding at most `capacity` items.
///
/// A capacity of zero is treated as one.
#[must_use]
pub fn bounded<T>(capacity: usize) -> (Dispatcher<T>, WorkQueue<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        Dispatcher { tx },
        WorkQueue {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producing end of the queue
#[derive(Debug)]
pub struct Dispatcher<T> {
    tx: mpsc::Sender<T>,
}

impl<T> Dispatcher<T> {
    /// Push every item in order, waiting whenever the queue is full, then close the queue.
    ///
    /// Returns the number of items enqueued. Stops early if every consumer has gone away.
    pub async fn dispatch_all(self, items: impl IntoIterator<Item = T>) -> usize {
        let mut sent = 0;
        for item in items {
            if self.tx.send(item).await.is_err() {
                log::warn!(target: LOG_TARGET, "All workers stopped; {sent} item(s) were dispatched");
                break;
            }
            sent += 1;
        }

        log::debug!(target: LOG_TARGET, "Dispatched {sent} item(s), closing queue");
        sent
    }
}

/// Consuming end of the queue, shared by all workers
#[derive(Debug)]
pub struct WorkQueue<T> {
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self { rx: Arc::clone(&self.rx) }
    }
}

impl<T> WorkQueue<T> {
    /// Wait for the next item. Returns `None` once the queue is closed and drained.
    pub async fn next(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }
}
