//! The presentation worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use framegen_core::clock::as_ms;
use framegen_core::{AtomicPerfStats, DisplaySink, Frame};
use framegen_queue::FrameConsumer;
use framegen_timing::{FpsMeter, PresentClock};
use tracing::{debug, info, warn};

use crate::config::ConfigCell;

/// Result of one presentation deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// A frame was handed to the sink
    Presented,
    /// The present queue was empty at the deadline
    Missed,
    /// The frame's fence did not signal within one interval
    NotReady,
    /// The sink reported an error
    SinkFailed,
}

impl PresentOutcome {
    /// Whether the deadline counted as a dropped frame.
    #[must_use]
    pub fn is_drop(self) -> bool {
        !matches!(self, PresentOutcome::Presented)
    }
}

/// State of the presentation stage.
pub struct PresentationWorker {
    input: FrameConsumer,
    sink: Box<dyn DisplaySink>,
    clock: PresentClock,
    fps: FpsMeter,
    stats: Arc<AtomicPerfStats>,
    config: Arc<ConfigCell>,
    applied_revision: u64,
    presented: u64,
}

impl std::fmt::Debug for PresentationWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentationWorker")
            .field("clock", &self.clock)
            .field("presented", &self.presented)
            .finish_non_exhaustive()
    }
}

impl PresentationWorker {
    /// Create the worker; the cadence comes from the display rate in `config`.
    #[must_use]
    pub fn new(
        input: FrameConsumer,
        sink: Box<dyn DisplaySink>,
        stats: Arc<AtomicPerfStats>,
        config: Arc<ConfigCell>,
    ) -> Self {
        let (applied_revision, snapshot) = config.snapshot();
        let now = Instant::now();
        Self {
            input,
            sink,
            clock: PresentClock::starting_at(now, snapshot.present_interval()),
            fps: FpsMeter::new(now),
            stats,
            config,
            applied_revision,
            presented: 0,
        }
    }

    /// The presentation clock.
    #[must_use]
    pub fn clock(&self) -> &PresentClock {
        &self.clock
    }

    /// Frames handed to the sink so far.
    #[must_use]
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Restart the cadence with the first deadline one interval after `now`.
    pub fn reset_clock(&mut self, now: Instant) {
        self.clock = PresentClock::starting_at(now, self.clock.interval());
        self.fps = FpsMeter::new(now);
    }

    /// Wait for the next deadline and present at most one frame.
    ///
    /// The clock advances by exactly one interval whatever the outcome.
    pub fn present_once(&mut self) -> PresentOutcome {
        self.sync_config();
        let deadline = self.clock.wait();

        let outcome = match self.input.pop() {
            Some(frame) => self.present_frame(&frame, deadline),
            None => {
                debug!(tick = self.clock.ticks(), "Present queue empty at deadline");
                PresentOutcome::Missed
            }
        };
        if outcome.is_drop() {
            self.stats.inc_dropped();
        }

        if let Some(fps) = self.fps.tick(Instant::now()) {
            self.stats.set_effective_fps(fps);
        }
        self.clock.advance();
        outcome
    }

    /// Worker loop: presents at the display cadence until `running` is cleared.
    #[must_use]
    pub fn run(mut self, running: &AtomicBool) -> Self {
        self.reset_clock(Instant::now());
        info!(
            interval_us = self.clock.interval().as_micros(),
            "Presentation worker started"
        );
        while running.load(Ordering::Acquire) {
            self.present_once();
        }
        info!(presented = self.presented, ticks = self.clock.ticks(), "Presentation worker stopped");
        self
    }

    fn present_frame(&mut self, frame: &Frame, deadline: Instant) -> PresentOutcome {
        if !frame.ready.wait_timeout(self.clock.interval()) {
            warn!(frame_index = frame.frame_index, "Frame not ready within one interval");
            return PresentOutcome::NotReady;
        }
        let start = Instant::now();
        let result = self.sink.present(frame, deadline);
        self.stats.set_present_ms(as_ms(start.elapsed()));
        match result {
            Ok(()) => {
                self.presented += 1;
                self.fps.record_frame();
                PresentOutcome::Presented
            }
            Err(e) => {
                warn!(error = %e, frame_index = frame.frame_index, "Display sink rejected frame");
                PresentOutcome::SinkFailed
            }
        }
    }

    fn sync_config(&mut self) {
        let Some((revision, config)) = self.config.newer_than(self.applied_revision) else {
            return;
        };
        let interval = config.present_interval();
        if interval != self.clock.interval() {
            info!(
                refresh_rate = config.target_refresh_rate,
                interval_us = interval.as_micros(),
                "Presentation rate changed"
            );
            self.clock.set_interval(interval);
        }
        self.applied_revision = revision;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framegen_core::{EngineConfig, GpuFence};
    use framegen_queue::{FrameProducer, FrameSlotQueue};
    use framegen_test_helpers::fixtures::gradient_frame;
    use framegen_test_helpers::mock::{FailingSink, PresentLog, RecordingSink};
    use std::time::Duration;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn config() -> Arc<ConfigCell> {
        let config = EngineConfig {
            target_refresh_rate: 500,
            ..EngineConfig::default()
        };
        Arc::new(ConfigCell::new(config))
    }

    fn recording() -> Result<(PresentationWorker, FrameProducer, PresentLog, Arc<AtomicPerfStats>), Box<dyn std::error::Error>> {
        let (tx, rx) = FrameSlotQueue::new(8)?;
        let (sink, log) = RecordingSink::new();
        let stats = Arc::new(AtomicPerfStats::new());
        let worker = PresentationWorker::new(rx, Box::new(sink), Arc::clone(&stats), config());
        Ok((worker, tx, log, stats))
    }

    #[test]
    fn test_empty_queue_drops_and_advances_one_interval() -> TestResult {
        let (mut worker, _tx, log, stats) = recording()?;
        let before = worker.clock().next_deadline();
        let interval = worker.clock().interval();
        assert_eq!(worker.present_once(), PresentOutcome::Missed);
        assert_eq!(stats.frames_dropped(), 1);
        assert_eq!(worker.clock().next_deadline(), before + interval);
        assert!(log.is_empty());
        Ok(())
    }

    #[test]
    fn test_presents_in_queue_order_at_deadlines() -> TestResult {
        let (mut worker, mut tx, log, stats) = recording()?;
        for i in 0..3 {
            assert!(tx.push(gradient_frame(4, 4, i)).is_ok());
        }
        let first = worker.clock().next_deadline();
        for _ in 0..3 {
            assert_eq!(worker.present_once(), PresentOutcome::Presented);
        }
        let frames = log.frames();
        let indices: Vec<u64> = frames.iter().map(|p| p.frame.frame_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(frames[0].deadline, first);
        assert_eq!(frames[2].deadline, first + worker.clock().interval() * 2);
        assert_eq!(worker.presented(), 3);
        assert_eq!(stats.frames_dropped(), 0);
        Ok(())
    }

    #[test]
    fn test_unsignaled_fence_is_dropped() -> TestResult {
        let (mut worker, mut tx, log, stats) = recording()?;
        let pending = gradient_frame(4, 4, 0).with_fence(GpuFence::new());
        assert!(tx.push(pending).is_ok());
        assert_eq!(worker.present_once(), PresentOutcome::NotReady);
        assert_eq!(stats.frames_dropped(), 1);
        assert!(log.is_empty());
        Ok(())
    }

    #[test]
    fn test_sink_failure_is_counted_not_fatal() -> TestResult {
        let (mut tx, rx) = FrameSlotQueue::new(4)?;
        let (sink, failures) = FailingSink::new();
        let stats = Arc::new(AtomicPerfStats::new());
        let mut worker = PresentationWorker::new(rx, Box::new(sink), Arc::clone(&stats), config());
        assert!(tx.push(gradient_frame(4, 4, 0)).is_ok());
        assert_eq!(worker.present_once(), PresentOutcome::SinkFailed);
        assert_eq!(worker.present_once(), PresentOutcome::Missed);
        assert_eq!(failures.load(std::sync::atomic::Ordering::Relaxed), 1);
        assert_eq!(stats.frames_dropped(), 2);
        Ok(())
    }

    #[test]
    fn test_rate_change_applies_to_later_deadlines() -> TestResult {
        let cell = config();
        let (_tx, rx) = FrameSlotQueue::new(4)?;
        let (sink, _log) = RecordingSink::new();
        let mut worker = PresentationWorker::new(
            rx,
            Box::new(sink),
            Arc::new(AtomicPerfStats::new()),
            Arc::clone(&cell),
        );
        cell.update(|c| c.target_refresh_rate = 1000);
        let before = worker.clock().next_deadline();
        worker.present_once();
        assert_eq!(worker.clock().interval(), Duration::from_millis(1));
        assert_eq!(worker.clock().next_deadline(), before + Duration::from_millis(1));
        Ok(())
    }
}
