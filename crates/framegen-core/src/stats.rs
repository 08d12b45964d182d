//! Pipeline statistics.
//!
//! Workers write into [`AtomicPerfStats`] from the hot path; the control
//! plane reads a [`PerfStats`] snapshot.
//!
//! # RT Safety
//!
//! Every setter is a single relaxed atomic store or fetch-add. Floats are
//! stored as their IEEE-754 bit patterns in `AtomicU32`.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::Serialize;

/// Number of scalars in [`PerfStats::to_array`].
pub const STATS_LEN: usize = 9;

/// Point-in-time statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PerfStats {
    /// Age of the captured frame when the interpolation worker took it
    pub capture_ms: f32,
    /// Motion / optical flow estimation time, part of `interpolation_ms`
    pub motion_ms: f32,
    /// Interpolation time for the last pair
    pub interpolation_ms: f32,
    /// Time spent handing the last frame to the display sink
    pub present_ms: f32,
    /// Capture, interpolation and present time
    pub total_ms: f32,
    /// Presented frames per second over the last full second
    pub effective_fps: f32,
    /// Last GPU temperature reading, 0 when unknown
    pub gpu_temp_celsius: f32,
    /// Synthetic frames delivered to the present queue
    pub frames_generated: u64,
    /// Frames dropped anywhere in the pipeline
    pub frames_dropped: u64,
}

impl PerfStats {
    /// Flatten to the control-surface layout:
    /// capture, motion, interp, present, total, fps, temp, generated, dropped.
    #[must_use]
    pub fn to_array(&self) -> [f32; STATS_LEN] {
        [
            self.capture_ms,
            self.motion_ms,
            self.interpolation_ms,
            self.present_ms,
            self.total_ms,
            self.effective_fps,
            self.gpu_temp_celsius,
            self.frames_generated as f32,
            self.frames_dropped as f32,
        ]
    }

    /// One-line overlay text for an on-screen performance monitor.
    #[must_use]
    pub fn overlay_text(&self) -> String {
        format!(
            "FPS: {:.1} | Cap: {:.2}ms | MV: {:.2}ms | AI: {:.2}ms | Pre: {:.2}ms | Tot: {:.2}ms | Gen: {} | Drop: {} | GPU: {:.1}C",
            self.effective_fps,
            self.capture_ms,
            self.motion_ms,
            self.interpolation_ms,
            self.present_ms,
            self.total_ms,
            self.frames_generated,
            self.frames_dropped,
            self.gpu_temp_celsius,
        )
    }
}

#[derive(Debug, Default)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    #[inline]
    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Lock-free statistics accumulator shared by the pipeline workers.
#[derive(Debug, Default)]
pub struct AtomicPerfStats {
    capture_ms: AtomicF32,
    motion_ms: AtomicF32,
    interpolation_ms: AtomicF32,
    present_ms: AtomicF32,
    total_ms: AtomicF32,
    effective_fps: AtomicF32,
    gpu_temp_celsius: AtomicF32,
    frames_generated: AtomicU64,
    frames_dropped: AtomicU64,
}

impl AtomicPerfStats {
    /// Create zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the interpolation-side stage timings of one iteration.
    ///
    /// `total_ms` is capture plus interpolation plus the last recorded present
    /// time. Motion estimation runs inside interpolation, so it is reported
    /// alone but not added again.
    pub fn record_stage_times(&self, capture_ms: f32, motion_ms: f32, interpolation_ms: f32) {
        self.capture_ms.store(capture_ms);
        self.motion_ms.store(motion_ms);
        self.interpolation_ms.store(interpolation_ms);
        let total = capture_ms + interpolation_ms + self.present_ms.load();
        self.total_ms.store(total);
    }

    /// Record the present time of the last frame.
    pub fn set_present_ms(&self, value: f32) {
        self.present_ms.store(value);
    }

    /// Record the effective output rate.
    pub fn set_effective_fps(&self, value: f32) {
        self.effective_fps.store(value);
    }

    /// Record a temperature reading; `None` stores 0.
    pub fn set_temperature(&self, celsius: Option<f32>) {
        self.gpu_temp_celsius.store(celsius.unwrap_or(0.0));
    }

    /// Count generated frames.
    pub fn add_generated(&self, count: u64) {
        self.frames_generated.fetch_add(count, Ordering::Relaxed);
    }

    /// Count dropped frames.
    pub fn add_dropped(&self, count: u64) {
        self.frames_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Count one dropped frame.
    pub fn inc_dropped(&self) {
        self.add_dropped(1);
    }

    /// Generated-frame counter.
    #[must_use]
    pub fn frames_generated(&self) -> u64 {
        self.frames_generated.load(Ordering::Relaxed)
    }

    /// Dropped-frame counter.
    #[must_use]
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    /// Read all values.
    #[must_use]
    pub fn snapshot(&self) -> PerfStats {
        PerfStats {
            capture_ms: self.capture_ms.load(),
            motion_ms: self.motion_ms.load(),
            interpolation_ms: self.interpolation_ms.load(),
            present_ms: self.present_ms.load(),
            total_ms: self.total_ms.load(),
            effective_fps: self.effective_fps.load(),
            gpu_temp_celsius: self.gpu_temp_celsius.load(),
            frames_generated: self.frames_generated(),
            frames_dropped: self.frames_dropped(),
        }
    }

    /// Reset every value to zero.
    pub fn reset(&self) {
        for value in [
            &self.capture_ms,
            &self.motion_ms,
            &self.interpolation_ms,
            &self.present_ms,
            &self.total_ms,
            &self.effective_fps,
            &self.gpu_temp_celsius,
        ] {
            value.store(0.0);
        }
        self.frames_generated.store(0, Ordering::Relaxed);
        self.frames_dropped.store(0, Ordering::Relaxed);
    }
}
