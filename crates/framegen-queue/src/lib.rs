//! Lock-free single-producer single-consumer lossy ring for frame handles.
//!
//! The pipeline moves frames between its stages through two of these
//! queues. A queue never blocks: a push into a full queue fails and is
//! counted as a dropped frame, a pop from an empty queue returns `None`.
//!
//! # Capacity
//!
//! A queue of capacity `C` holds at most `C - 1` items. Items live in a
//! `crossbeam` [`ArrayQueue`](crossbeam::queue::ArrayQueue) of `C - 1` cells;
//! a shared length counter decides fullness without locking.
//!
//! # Memory visibility
//!
//! With one producer and one consumer only the producer advances the write
//! index and only the consumer advances the read index. The array publishes
//! each cell with release ordering and reads it with acquire ordering. The
//! length counter is raised by the producer before an item is published and
//! lowered by the consumer after it is taken, so it never undercounts.
//!
//! `peek` moves the head item into the consumer handle; it stays counted in
//! the length until `pop` hands it out.
//!
//! # Single producer, single consumer
//!
//! [`slot_queue`] returns one [`Producer`] and one [`Consumer`]; neither is
//! `Clone` and both mutate through `&mut self`, so the SPSC contract is
//! enforced by the type system. [`QueueMonitor`] handles may be cloned freely
//! for size and drop statistics.
//!
//! # Example
//!
//! ```
//! use framegen_queue::slot_queue;
//!
//! let (mut tx, mut rx) = slot_queue::<u32>(4)?;
//! assert!(tx.push(1).is_ok());
//! assert!(tx.push(2).is_ok());
//! assert!(tx.push(3).is_ok());
//! assert_eq!(tx.push(4), Err(4));
//! assert_eq!(tx.monitor().dropped(), 1);
//! assert_eq!(rx.peek(), Some(&1));
//! assert_eq!(rx.pop(), Some(1));
//! # Ok::<(), framegen_errors::ValidationError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs, rust_2018_idioms)]

mod ring;

pub use ring::{Consumer, Producer, QueueMonitor, QueueStats, slot_queue};

use framegen_core::Frame;
use framegen_errors::ValidationError;

/// Write end of a frame queue.
pub type FrameProducer = Producer<Frame>;

/// Read end of a frame queue.
pub type FrameConsumer = Consumer<Frame>;

/// Statistics handle of a frame queue.
pub type FrameQueueMonitor = QueueMonitor<Frame>;

/// Captured-frame queue depth used by the pipeline.
pub const DEFAULT_CAPTURE_DEPTH: usize = 8;

/// Present queue depth used by the pipeline.
pub const DEFAULT_PRESENT_DEPTH: usize = 16;

/// Constructor namespace for frame queues.
#[derive(Debug, Clone, Copy)]
pub struct FrameSlotQueue;

impl FrameSlotQueue {
    /// Create a frame queue of the given capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] if `capacity < 2`.
    pub fn new(capacity: usize) -> Result<(FrameProducer, FrameConsumer), ValidationError> {
        slot_queue(capacity)
    }
}
