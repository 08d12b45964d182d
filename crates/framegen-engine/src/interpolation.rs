//! The interpolation worker.
//!
//! Pops captured frames, forwards them in capture order and places the
//! synthetic frames of each pair between its endpoints. Per-frame latency
//! goes to the adaptive controller after every batch and any adjustment is
//! applied to the engine before the next pair.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use framegen_core::clock::{age_of, as_ms};
use framegen_core::{AtomicPerfStats, EngineConfig, Frame};
use framegen_errors::InterpolationError;
use framegen_interp::InterpolationEngine;
use framegen_queue::{FrameConsumer, FrameProducer};
use framegen_timing::AdaptiveTimingController;
use tracing::{debug, info, warn};

use crate::config::ConfigCell;

/// Sleep between polls of an empty capture queue.
pub const IDLE_POLL: Duration = Duration::from_micros(500);

/// What one call to [`InterpolationWorker::process_frame`] enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchReport {
    /// Captured frames placed on the present queue
    pub captured: usize,
    /// Synthetic frames placed on the present queue
    pub generated: usize,
    /// Frames lost to a full present queue
    pub dropped: usize,
}

/// State of the interpolation stage. Moved onto its thread by
/// [`crate::PipelineOrchestrator::start`] and handed back on join.
pub struct InterpolationWorker {
    input: FrameConsumer,
    output: FrameProducer,
    engine: InterpolationEngine,
    controller: Arc<AdaptiveTimingController>,
    stats: Arc<AtomicPerfStats>,
    config: Arc<ConfigCell>,
    applied: EngineConfig,
    applied_revision: u64,
    previous: Option<Frame>,
    previous_forwarded: bool,
}

impl std::fmt::Debug for InterpolationWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpolationWorker")
            .field("strategy", &self.engine.strategy())
            .field("mode", &self.applied.mode)
            .field("applied_revision", &self.applied_revision)
            .field("previous", &self.previous.as_ref().map(|p| p.frame_index))
            .finish()
    }
}

impl InterpolationWorker {
    /// Create the worker. The engine and controller are expected to have
    /// been built from the configuration currently in `config`.
    #[must_use]
    pub fn new(
        input: FrameConsumer,
        output: FrameProducer,
        engine: InterpolationEngine,
        controller: Arc<AdaptiveTimingController>,
        stats: Arc<AtomicPerfStats>,
        config: Arc<ConfigCell>,
    ) -> Self {
        let (applied_revision, applied) = config.snapshot();
        Self {
            input,
            output,
            engine,
            controller,
            stats,
            config,
            applied,
            applied_revision,
            previous: None,
            previous_forwarded: false,
        }
    }

    /// The interpolation engine.
    #[must_use]
    pub fn engine(&self) -> &InterpolationEngine {
        &self.engine
    }

    /// Index of the remembered previous frame.
    #[must_use]
    pub fn previous_index(&self) -> Option<u64> {
        self.previous.as_ref().map(|p| p.frame_index)
    }

    /// Revision of the configuration last applied.
    #[must_use]
    pub fn applied_revision(&self) -> u64 {
        self.applied_revision
    }

    /// Handle one captured frame.
    pub fn process_frame(&mut self, current: Frame) -> BatchReport {
        self.sync_config();
        let capture_ms = as_ms(age_of(current.timestamp_ns));
        let mut report = BatchReport::default();

        let Some(previous) = self.previous.take() else {
            self.enqueue_captured(current.clone(), &mut report);
            self.remember(current, true);
            self.stats.record_stage_times(capture_ms, 0.0, 0.0);
            return report;
        };

        if !self.previous_forwarded {
            self.enqueue_captured(previous.clone(), &mut report);
        }

        let count = self.applied.mode.intermediate_count();
        if count == 0 {
            self.enqueue_captured(current.clone(), &mut report);
            self.remember(current, true);
            self.stats.record_stage_times(capture_ms, 0.0, 0.0);
            return report;
        }

        let start = Instant::now();
        let result = self.engine.interpolate_multi(&previous, &current, count);
        let elapsed = start.elapsed();

        let attempted = match &result {
            Ok(frames) => (frames.len() + 1).min(count),
            Err(_) => 1,
        };
        match result {
            Ok(frames) => {
                for frame in frames {
                    if self.enqueue(frame, &mut report) {
                        report.generated += 1;
                    }
                }
            }
            Err(e) => log_failure(&e, &previous, &current),
        }
        self.stats.add_generated(report.generated as u64);

        let interpolation_ms = as_ms(elapsed);
        self.stats.record_stage_times(
            capture_ms,
            as_ms(self.engine.last_motion_elapsed()),
            interpolation_ms,
        );
        self.report_latency(interpolation_ms / attempted as f32);
        self.remember(current, false);
        report
    }

    /// Forward the remembered frame if it has not been forwarded yet.
    ///
    /// Returns `true` if a frame was enqueued.
    pub fn flush(&mut self) -> bool {
        if self.previous_forwarded {
            return false;
        }
        let Some(previous) = self.previous.clone() else {
            return false;
        };
        let mut report = BatchReport::default();
        self.enqueue_captured(previous, &mut report);
        self.previous_forwarded = true;
        report.captured == 1
    }

    /// Worker loop: runs until `running` is cleared, then flushes.
    #[must_use]
    pub fn run(mut self, running: &AtomicBool) -> Self {
        self.previous = None;
        self.previous_forwarded = false;
        info!(strategy = %self.engine.strategy(), "Interpolation worker started");

        let mut processed = 0u64;
        while running.load(Ordering::Acquire) {
            match self.input.pop() {
                Some(frame) => {
                    self.process_frame(frame);
                    processed += 1;
                }
                None => thread::sleep(IDLE_POLL),
            }
        }
        self.flush();
        info!(processed, "Interpolation worker stopped");
        self
    }

    fn sync_config(&mut self) {
        let Some((revision, config)) = self.config.newer_than(self.applied_revision) else {
            return;
        };
        if config.mode != self.applied.mode {
            info!(from = %self.applied.mode, to = %config.mode, "Interpolation mode changed");
        }
        if config.quality.to_bits() != self.applied.quality.to_bits() {
            self.engine.set_quality(config.quality);
            self.controller.override_quality(config.quality);
            info!(quality = config.quality, scale = self.engine.model_scale(), "Quality set");
        }
        if config.max_frame_time_ns != self.applied.max_frame_time_ns {
            self.engine.set_budget_ns(config.max_frame_time_ns);
            self.controller.set_budget_ns(config.max_frame_time_ns);
        }
        if config.thermal_protection != self.applied.thermal_protection {
            self.controller.set_thermal_protection(config.thermal_protection);
        }
        self.applied = config;
        self.applied_revision = revision;
    }

    fn report_latency(&mut self, frame_ms: f32) {
        let verdict = self.controller.on_frame_complete(frame_ms);
        if verdict.changed() {
            self.engine.apply_adaptive(verdict.quality, verdict.scale);
        }
        self.stats.set_temperature(self.controller.temperature());
    }

    fn remember(&mut self, frame: Frame, forwarded: bool) {
        self.previous = Some(frame);
        self.previous_forwarded = forwarded;
    }

    fn enqueue_captured(&mut self, frame: Frame, report: &mut BatchReport) {
        if self.enqueue(frame, report) {
            report.captured += 1;
        }
    }

    fn enqueue(&mut self, frame: Frame, report: &mut BatchReport) -> bool {
        match self.output.push(frame) {
            Ok(()) => true,
            Err(frame) => {
                report.dropped += 1;
                self.stats.inc_dropped();
                warn!(
                    frame_index = frame.frame_index,
                    synthetic = frame.is_synthetic(),
                    "Present queue full, frame dropped"
                );
                false
            }
        }
    }
}

fn log_failure(error: &InterpolationError, from: &Frame, to: &Frame) {
    if error.is_budget_exceeded() {
        debug!(error = %error, from = from.frame_index, to = to.frame_index, "No frame in budget");
    } else {
        warn!(
            error = %error,
            category = ?error.category(),
            from = from.frame_index,
            to = to.frame_index,
            "Interpolation failed"
        );
    }
}
