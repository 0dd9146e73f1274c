//! Bounded in-process FIFO shared by a producer side and a single consumer loop.

use tokio::sync::{Mutex, mpsc};

/// Default number of slots, matching the historical queue size of both services.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// A fixed-capacity FIFO backed by a tokio mpsc channel.
///
/// - `enqueue` waits while the queue is full (backpressure, no timeout)
/// - `dequeue` waits while the queue is empty
/// - items come out in the order they went in
///
/// The queue is volatile: anything still buffered when the process exits is
/// lost. It is meant to be constructed once at startup and shared by `Arc`.
pub struct BoundedQueue<T> {
    sender: mpsc::Sender<T>,
    receiver: Mutex<mpsc::Receiver<T>>,
}

impl<T: Send> BoundedQueue<T> {
    /// Creates a queue with the given number of slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Creates a queue with [`DEFAULT_CAPACITY`] slots.
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Appends an item, waiting for a free slot when the queue is full.
    pub async fn enqueue(&self, item: T) {
        // The receiver is owned by `self`, so the channel cannot be closed here.
        let _ = self.sender.send(item).await;
    }

    /// Removes the oldest item, waiting until one is available.
    ///
    /// Returns `None` only if the channel has been torn down, which callers
    /// treat as an empty result.
    pub async fn dequeue(&self) -> Option<T> {
        self.receiver.lock().await.recv().await
    }

    /// Removes the oldest item without waiting.
    ///
    /// Returns `None` when the queue is empty or another task is currently
    /// waiting in [`dequeue`](Self::dequeue).
    pub fn try_dequeue(&self) -> Option<T> {
        self.receiver.try_lock().ok()?.try_recv().ok()
    }

    /// Number of items currently buffered.
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Returns true if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}

impl<T: Send> Default for BoundedQueue<T> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
