//! Capture-side handle of the captured-frame queue.

use std::sync::Arc;

use framegen_core::{AtomicPerfStats, Frame, FrameSource};
use framegen_queue::{FrameProducer, FrameQueueMonitor};
use tracing::debug;

/// Write end of the captured-frame queue, held by whoever produces frames.
///
/// There is exactly one per engine. Submissions never block: a full queue
/// drops the frame and counts it.
#[derive(Debug)]
pub struct CaptureHandle {
    producer: FrameProducer,
    stats: Arc<AtomicPerfStats>,
}

impl CaptureHandle {
    pub(crate) fn new(producer: FrameProducer, stats: Arc<AtomicPerfStats>) -> Self {
        Self { producer, stats }
    }

    /// Queue a captured frame. Returns `false` if it was dropped.
    pub fn submit(&mut self, frame: Frame) -> bool {
        match self.producer.push(frame) {
            Ok(()) => true,
            Err(frame) => {
                self.stats.inc_dropped();
                debug!(frame_index = frame.frame_index, "Capture queue full, frame dropped");
                false
            }
        }
    }

    /// Pull up to `limit` frames from `source` and submit them.
    ///
    /// Returns how many frames were accepted. Stops early when the source is
    /// exhausted.
    pub fn pump(&mut self, source: &mut dyn FrameSource, limit: usize) -> usize {
        let mut accepted = 0;
        for _ in 0..limit {
            let Some(frame) = source.next_frame() else {
                break;
            };
            if self.submit(frame) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Frames waiting for the interpolation worker.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.producer.len()
    }

    /// Statistics handle of the captured-frame queue.
    #[must_use]
    pub fn monitor(&self) -> FrameQueueMonitor {
        self.producer.monitor()
    }
}
