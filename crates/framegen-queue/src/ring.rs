use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam::queue::ArrayQueue;
use framegen_errors::ValidationError;

struct Shared<T> {
    items: ArrayQueue<T>,
    /// Slot count `C`; `items` has room for `C - 1`.
    capacity: usize,
    /// Items owned by the queue, including one staged by `peek`.
    /// Raised only by the producer before a push, lowered only by the
    /// consumer after a pop, so it never undercounts.
    len: AtomicUsize,
    pushed: AtomicU64,
    popped: AtomicU64,
    dropped: AtomicU64,
}

impl<T> Shared<T> {
    #[inline]
    fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.len() >= self.capacity - 1
    }
}

/// Create a queue of capacity `capacity`, holding at most `capacity - 1` items.
///
/// # Errors
///
/// Returns [`ValidationError::OutOfRange`] if `capacity < 2`.
pub fn slot_queue<T: Send>(capacity: usize) -> Result<(Producer<T>, Consumer<T>), ValidationError> {
    if capacity < 2 {
        return Err(ValidationError::out_of_range(
            "queue_capacity",
            capacity,
            2,
            usize::MAX,
        ));
    }
    let shared = Arc::new(Shared {
        items: ArrayQueue::new(capacity - 1),
        capacity,
        len: AtomicUsize::new(0),
        pushed: AtomicU64::new(0),
        popped: AtomicU64::new(0),
        dropped: AtomicU64::new(0),
    });
    Ok((
        Producer {
            shared: Arc::clone(&shared),
        },
        Consumer {
            shared,
            staged: None,
        },
    ))
}

/// Write end of a slot queue.
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Producer<T> {
    /// Push an item without blocking.
    ///
    /// # Errors
    ///
    /// When the queue is full the item is handed back and the dropped
    /// counter is incremented.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        let shared = &*self.shared;
        if shared.is_full() {
            shared.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(item);
        }
        // Reserve before publishing so the consumer can never pop an item
        // that `len` has not counted yet.
        shared.len.fetch_add(1, Ordering::AcqRel);
        if let Err(item) = shared.items.push(item) {
            shared.len.fetch_sub(1, Ordering::AcqRel);
            shared.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(item);
        }
        shared.pushed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Whether the next push would fail.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.shared.is_full()
    }

    /// Items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot count `C`; at most `C - 1` items fit.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Statistics handle.
    #[must_use]
    pub fn monitor(&self) -> QueueMonitor<T> {
        QueueMonitor {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Read end of a slot queue.
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
    /// Head item taken out of the array by `peek`, still counted in `len`.
    staged: Option<T>,
}

impl<T> Consumer<T> {
    /// Take the oldest item, or `None` if the queue is empty.
    pub fn pop(&mut self) -> Option<T> {
        let item = self.staged.take().or_else(|| self.shared.items.pop())?;
        self.shared.len.fetch_sub(1, Ordering::AcqRel);
        self.shared.popped.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }

    /// Inspect the oldest item without removing it.
    pub fn peek(&mut self) -> Option<&T> {
        if self.staged.is_none() {
            self.staged = self.shared.items.pop();
        }
        self.staged.as_ref()
    }

    /// Drop every queued item; returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let mut removed = 0;
        while self.pop().is_some() {
            removed += 1;
        }
        removed
    }

    /// Items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot count `C`; at most `C - 1` items fit.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Statistics handle.
    #[must_use]
    pub fn monitor(&self) -> QueueMonitor<T> {
        QueueMonitor {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Counter snapshot returned by [`QueueMonitor::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    /// Items currently queued
    pub len: usize,
    /// Slot count
    pub capacity: usize,
    /// Successful pushes
    pub pushed: u64,
    /// Successful pops
    pub popped: u64,
    /// Pushes rejected because the queue was full
    pub dropped: u64,
}

/// Read-only view of a queue's size and counters.
pub struct QueueMonitor<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for QueueMonitor<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> QueueMonitor<T> {
    /// Items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Pushes rejected because the queue was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// All counters at once.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            len: self.len(),
            capacity: self.capacity(),
            pushed: self.shared.pushed.load(Ordering::Relaxed),
            popped: self.shared.popped.load(Ordering::Relaxed),
            dropped: self.dropped(),
        }
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("staged", &self.staged.is_some())
            .finish()
    }
}

impl<T> fmt::Debug for QueueMonitor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueMonitor")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_below_two_rejected() {
        assert!(slot_queue::<u8>(0).is_err());
        assert!(slot_queue::<u8>(1).is_err());
        assert!(slot_queue::<u8>(2).is_ok());
    }

    #[test]
    fn test_holds_capacity_minus_one() -> Result<(), ValidationError> {
        let (mut tx, rx) = slot_queue::<u32>(8)?;
        for i in 0..7 {
            assert!(tx.push(i).is_ok(), "push {i} should fit");
        }
        assert!(tx.is_full());
        assert_eq!(tx.push(99), Err(99));
        assert_eq!(rx.len(), 7);
        assert_eq!(rx.monitor().dropped(), 1);
        Ok(())
    }

    #[test]
    fn test_fifo_across_wraparound() -> Result<(), ValidationError> {
        let (mut tx, mut rx) = slot_queue::<u32>(3)?;
        for round in 0..10u32 {
            assert!(tx.push(round * 2).is_ok());
            assert!(tx.push(round * 2 + 1).is_ok());
            assert_eq!(rx.pop(), Some(round * 2));
            assert_eq!(rx.pop(), Some(round * 2 + 1));
            assert!(rx.pop().is_none());
        }
        let stats = rx.monitor().stats();
        assert_eq!(stats.pushed, 20);
        assert_eq!(stats.popped, 20);
        assert_eq!(stats.dropped, 0);
        Ok(())
    }

    #[test]
    fn test_peek_is_non_destructive() -> Result<(), ValidationError> {
        let (mut tx, mut rx) = slot_queue::<String>(4)?;
        assert!(rx.peek().is_none());
        assert!(tx.push("a".to_string()).is_ok());
        assert_eq!(rx.peek().map(String::as_str), Some("a"));
        assert_eq!(rx.len(), 1);
        assert_eq!(rx.pop().as_deref(), Some("a"));
        Ok(())
    }

    #[test]
    fn test_peeked_item_still_occupies_a_slot() -> Result<(), ValidationError> {
        let (mut tx, mut rx) = slot_queue::<u32>(3)?;
        assert!(tx.push(1).is_ok());
        assert!(tx.push(2).is_ok());
        assert_eq!(rx.peek(), Some(&1));
        assert!(tx.is_full());
        assert_eq!(tx.push(3), Err(3));
        assert_eq!(rx.pop(), Some(1));
        assert!(tx.push(3).is_ok());
        assert_eq!(rx.pop(), Some(2));
        assert_eq!(rx.pop(), Some(3));
        assert!(rx.is_empty());
        Ok(())
    }

    #[test]
    fn test_clear_drains() -> Result<(), ValidationError> {
        let (mut tx, mut rx) = slot_queue::<u8>(5)?;
        for i in 0..4 {
            assert!(tx.push(i).is_ok());
        }
        assert_eq!(rx.peek(), Some(&0));
        assert_eq!(rx.clear(), 4);
        assert!(rx.is_empty());
        assert!(tx.push(1).is_ok());
        Ok(())
    }

    #[test]
    fn test_queued_items_dropped_with_queue() -> Result<(), ValidationError> {
        let item = Arc::new(());
        {
            let (mut tx, mut rx) = slot_queue::<Arc<()>>(4)?;
            assert!(tx.push(Arc::clone(&item)).is_ok());
            assert!(tx.push(Arc::clone(&item)).is_ok());
            assert!(rx.peek().is_some());
            assert_eq!(Arc::strong_count(&item), 3);
        }
        assert_eq!(Arc::strong_count(&item), 1);
        Ok(())
    }
}
