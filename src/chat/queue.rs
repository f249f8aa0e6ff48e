//! FIFO of outbound message requests.
//!
//! Any number of HTTP handlers may enqueue concurrently; the host tick is the
//! only consumer.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use super::message::NewMessageRequest;

/// Error returned when the queue is at its limit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("too many pending messages (limit {limit})")]
pub struct QueueFull {
    /// Configured limit.
    pub limit: usize,
}

/// Bounded, thread-safe FIFO of [`NewMessageRequest`]s.
#[derive(Debug)]
pub struct InjectionQueue {
    pending: Mutex<VecDeque<NewMessageRequest>>,
    limit: usize,
}

impl InjectionQueue {
    /// Create an empty queue holding at most `limit` requests.
    pub fn new(limit: usize) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            limit: limit.max(1),
        }
    }

    /// Maximum number of pending requests.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of pending requests.
    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a request to the back of the queue.
    pub fn enqueue(&self, request: NewMessageRequest) -> Result<(), QueueFull> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.len() >= self.limit {
            return Err(QueueFull { limit: self.limit });
        }
        pending.push_back(request);
        Ok(())
    }

    /// Take every pending request, oldest first.
    pub fn drain_batch(&self) -> Vec<NewMessageRequest> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    /// Put unprocessed requests back at the front, keeping their order.
    ///
    /// Requests enqueued since the batch was drained stay behind them. The
    /// limit is not enforced here; returned items were already accepted.
    pub fn requeue_front(&self, unprocessed: Vec<NewMessageRequest>) {
        if unprocessed.is_empty() {
            return;
        }
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        for request in unprocessed.into_iter().rev() {
            pending.push_front(request);
        }
    }
}
