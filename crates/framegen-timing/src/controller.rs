//! Latency- and temperature-driven quality control.
//!
//! The controller keeps a sliding window of per-frame interpolation times
//! and two mutually exclusive streak counters. Rules, in priority order:
//!
//! 1. Thermal protection on and temperature above [`THERMAL_CRITICAL_C`]:
//!    force minimum scale and zero quality, report over budget.
//! 2. Throttled (above [`THERMAL_THROTTLE_C`]) and
//!    [`THROTTLED_OVER_STREAK`] frames over budget in a row: reduce.
//! 3. [`OVER_STREAK`] frames over budget in a row: reduce.
//! 4. [`UNDER_STREAK`] frames under budget in a row and the window average
//!    below [`HEADROOM_RATIO`] of the target: increase.
//!
//! Any reduction or increase resets both streaks.

use std::collections::VecDeque;
use std::sync::Arc;

use framegen_core::{EngineConfig, MIN_MODEL_SCALE, ThermalSensor, scale_for_quality};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Samples kept for the latency statistics.
pub const WINDOW_SIZE: usize = 60;
/// Above this temperature quality is forced to its minimum.
pub const THERMAL_CRITICAL_C: f32 = 85.0;
/// Above this temperature the device counts as throttled.
pub const THERMAL_THROTTLE_C: f32 = 75.0;
/// Over-budget streak that triggers a reduction while throttled.
pub const THROTTLED_OVER_STREAK: u32 = 3;
/// Over-budget streak that triggers a reduction.
pub const OVER_STREAK: u32 = 5;
/// Under-budget streak that allows an increase.
pub const UNDER_STREAK: u32 = 30;
/// Average latency must be below this fraction of the target to increase.
pub const HEADROOM_RATIO: f32 = 0.7;
/// Scale step of one reduction.
pub const REDUCE_SCALE_STEP: f32 = 0.1;
/// Quality step of one reduction.
pub const REDUCE_QUALITY_STEP: f32 = 0.15;
/// Scale step of one increase.
pub const INCREASE_SCALE_STEP: f32 = 0.05;
/// Quality step of one increase.
pub const INCREASE_QUALITY_STEP: f32 = 0.05;
/// Increases never raise the scale beyond this.
pub const MAX_ADAPTIVE_SCALE: f32 = 0.75;

/// What the controller did with one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Adjustment {
    /// Knobs unchanged
    None,
    /// Scale and quality lowered one step
    Reduced,
    /// Scale and quality raised one step
    Increased,
    /// Knobs forced to their minimum by temperature
    ThermalCritical,
}

/// Result of [`AdaptiveTimingController::on_frame_complete`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingVerdict {
    /// Whether the frame counts as within budget
    pub within_budget: bool,
    /// What changed
    pub adjustment: Adjustment,
    /// Model scale after this sample
    pub scale: f32,
    /// Quality after this sample
    pub quality: f32,
}

impl TimingVerdict {
    /// Whether the knobs changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.adjustment != Adjustment::None
    }
}

/// Snapshot of the controller state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveState {
    /// Current model scale
    pub current_scale: f32,
    /// Current quality
    pub current_quality: f32,
    /// Target per-frame latency
    pub target_ms: f32,
    /// Window average
    pub avg_ms: f32,
    /// Window minimum
    pub min_ms: f32,
    /// Window maximum
    pub max_ms: f32,
    /// Temperature above the throttle threshold with protection on
    pub throttled: bool,
    /// Frames over budget in a row
    pub consecutive_over: u32,
    /// Frames within budget in a row
    pub consecutive_under: u32,
    /// Last temperature reading
    pub temperature_c: Option<f32>,
}

struct Inner {
    state: AdaptiveState,
    window: VecDeque<f32>,
    thermal_protection: bool,
    initial: (f32, f32),
}

impl Inner {
    fn record(&mut self, frame_ms: f32) -> bool {
        if self.window.len() == WINDOW_SIZE {
            self.window.pop_front();
        }
        self.window.push_back(frame_ms);

        let (sum, min, max) = self.window.iter().fold(
            (0.0f32, f32::INFINITY, f32::NEG_INFINITY),
            |(s, lo, hi), &v| (s + v, lo.min(v), hi.max(v)),
        );
        self.state.avg_ms = sum / self.window.len() as f32;
        self.state.min_ms = min;
        self.state.max_ms = max;

        let over = frame_ms > self.state.target_ms;
        if over {
            self.state.consecutive_over += 1;
            self.state.consecutive_under = 0;
        } else {
            self.state.consecutive_under += 1;
            self.state.consecutive_over = 0;
        }
        over
    }

    fn reduce(&mut self) {
        let s = &mut self.state;
        s.current_scale = (s.current_scale - REDUCE_SCALE_STEP).max(MIN_MODEL_SCALE);
        s.current_quality = (s.current_quality - REDUCE_QUALITY_STEP).max(0.0);
        self.reset_streaks();
    }

    fn increase(&mut self) {
        let s = &mut self.state;
        s.current_scale = (s.current_scale + INCREASE_SCALE_STEP).min(MAX_ADAPTIVE_SCALE);
        s.current_quality = (s.current_quality + INCREASE_QUALITY_STEP).min(1.0);
        self.reset_streaks();
    }

    fn reset_streaks(&mut self) {
        self.state.consecutive_over = 0;
        self.state.consecutive_under = 0;
    }

    fn verdict(&self, within_budget: bool, adjustment: Adjustment) -> TimingVerdict {
        TimingVerdict {
            within_budget,
            adjustment,
            scale: self.state.current_scale,
            quality: self.state.current_quality,
        }
    }
}

/// Adjusts the quality knobs from observed latency and temperature.
///
/// All state sits behind one mutex and every critical section is bounded
/// by the window size. Temperature is read before the lock is taken.
pub struct AdaptiveTimingController {
    inner: Mutex<Inner>,
    sensor: Option<Arc<dyn ThermalSensor>>,
}

impl std::fmt::Debug for AdaptiveTimingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveTimingController")
            .field("state", &self.state())
            .field("has_sensor", &self.sensor.is_some())
            .finish()
    }
}

impl AdaptiveTimingController {
    /// Create a controller.
    #[must_use]
    pub fn new(
        target_ms: f32,
        quality: f32,
        scale: f32,
        thermal_protection: bool,
        sensor: Option<Arc<dyn ThermalSensor>>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: AdaptiveState {
                    current_scale: scale,
                    current_quality: quality,
                    target_ms,
                    avg_ms: 0.0,
                    min_ms: 0.0,
                    max_ms: 0.0,
                    throttled: false,
                    consecutive_over: 0,
                    consecutive_under: 0,
                    temperature_c: None,
                },
                window: VecDeque::with_capacity(WINDOW_SIZE),
                thermal_protection,
                initial: (quality, scale),
            }),
            sensor,
        }
    }

    /// Create a controller from the engine configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig, sensor: Option<Arc<dyn ThermalSensor>>) -> Self {
        Self::new(
            config.max_frame_time_ns as f32 / 1_000_000.0,
            config.quality,
            config.model_scale,
            config.thermal_protection,
            sensor,
        )
    }

    /// Record one frame's interpolation time and apply the rules.
    pub fn on_frame_complete(&self, frame_ms: f32) -> TimingVerdict {
        let protection = self.inner.lock().thermal_protection;
        let temperature = if protection {
            self.sensor.as_ref().and_then(|s| s.read_celsius())
        } else {
            None
        };

        let mut inner = self.inner.lock();
        let over = inner.record(frame_ms);
        inner.state.temperature_c = temperature;
        let hot = |limit: f32| inner.thermal_protection && temperature.is_some_and(|t| t > limit);
        let critical = hot(THERMAL_CRITICAL_C);
        let throttled = hot(THERMAL_THROTTLE_C);
        inner.state.throttled = throttled;

        if critical {
            inner.state.current_scale = MIN_MODEL_SCALE;
            inner.state.current_quality = 0.0;
            warn!(
                temperature_c = temperature.unwrap_or_default(),
                "Thermal critical, forcing minimum quality"
            );
            return inner.verdict(false, Adjustment::ThermalCritical);
        }

        let s = inner.state;
        if (throttled && s.consecutive_over >= THROTTLED_OVER_STREAK) || s.consecutive_over >= OVER_STREAK {
            inner.reduce();
            warn!(
                frame_ms,
                avg_ms = s.avg_ms,
                throttled,
                scale = inner.state.current_scale,
                quality = inner.state.current_quality,
                "Over budget, reducing quality"
            );
            return inner.verdict(false, Adjustment::Reduced);
        }

        if s.consecutive_under >= UNDER_STREAK && s.avg_ms < HEADROOM_RATIO * s.target_ms {
            inner.increase();
            debug!(
                avg_ms = s.avg_ms,
                scale = inner.state.current_scale,
                quality = inner.state.current_quality,
                "Headroom available, increasing quality"
            );
            return inner.verdict(!over, Adjustment::Increased);
        }

        inner.verdict(!over, Adjustment::None)
    }

    /// Snapshot of the state.
    #[must_use]
    pub fn state(&self) -> AdaptiveState {
        self.inner.lock().state
    }

    /// Last temperature reading.
    #[must_use]
    pub fn temperature(&self) -> Option<f32> {
        self.inner.lock().state.temperature_c
    }

    /// Whether the last sample found the device throttled.
    #[must_use]
    pub fn is_thermal_throttled(&self) -> bool {
        self.inner.lock().state.throttled
    }

    /// Read the sensor without recording a frame; `None` with protection off.
    #[must_use]
    pub fn sample_temperature(&self) -> Option<f32> {
        if !self.inner.lock().thermal_protection {
            return None;
        }
        let reading = self.sensor.as_ref().and_then(|s| s.read_celsius());
        let mut inner = self.inner.lock();
        inner.state.temperature_c = reading;
        inner.state.throttled = reading.is_some_and(|t| t > THERMAL_THROTTLE_C);
        reading
    }

    /// Replace the target latency.
    pub fn set_target_ms(&self, target_ms: f32) {
        self.inner.lock().state.target_ms = target_ms;
    }

    /// Replace the target latency from a budget in nanoseconds.
    pub fn set_budget_ns(&self, budget_ns: u64) {
        self.set_target_ms(budget_ns as f32 / 1_000_000.0);
    }

    /// Set quality from the control plane; the scale follows the quality tier.
    pub fn override_quality(&self, quality: f32) {
        let quality = if quality.is_nan() { 0.0 } else { quality.clamp(0.0, 1.0) };
        let mut inner = self.inner.lock();
        inner.state.current_quality = quality;
        inner.state.current_scale = scale_for_quality(quality);
        inner.reset_streaks();
    }

    /// Enable or disable thermal protection.
    pub fn set_thermal_protection(&self, enabled: bool) {
        let mut inner = self.inner.lock();
        inner.thermal_protection = enabled;
        if !enabled {
            inner.state.throttled = false;
        }
    }

    /// Clear the window and streaks and restore the initial knobs.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let (quality, scale) = inner.initial;
        inner.window.clear();
        let target_ms = inner.state.target_ms;
        inner.state = AdaptiveState {
            current_scale: scale,
            current_quality: quality,
            target_ms,
            avg_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
            throttled: false,
            consecutive_over: 0,
            consecutive_under: 0,
            temperature_c: None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> AdaptiveTimingController {
        AdaptiveTimingController::new(8.0, 0.5, 0.5, false, None)
    }

    #[test]
    fn test_streaks_are_exclusive() {
        let c = controller();
        c.on_frame_complete(9.0);
        c.on_frame_complete(9.0);
        assert_eq!(c.state().consecutive_over, 2);
        c.on_frame_complete(1.0);
        let s = c.state();
        assert_eq!((s.consecutive_over, s.consecutive_under), (0, 1));
    }

    #[test]
    fn test_window_statistics() {
        let c = controller();
        for ms in [2.0, 4.0, 6.0] {
            c.on_frame_complete(ms);
        }
        let s = c.state();
        assert!((s.avg_ms - 4.0).abs() < 1e-6);
        assert!((s.min_ms - 2.0).abs() < 1e-6);
        assert!((s.max_ms - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_window_is_bounded() {
        let c = controller();
        for _ in 0..WINDOW_SIZE {
            c.on_frame_complete(100.0);
        }
        for _ in 0..WINDOW_SIZE {
            c.on_frame_complete(1.0);
        }
        assert!((c.state().max_ms - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_increase_caps_scale_from_above_ceiling() {
        let c = AdaptiveTimingController::new(10.0, 0.5, 1.0, false, None);
        for _ in 0..UNDER_STREAK {
            c.on_frame_complete(1.0);
        }
        let s = c.state();
        assert!((s.current_scale - MAX_ADAPTIVE_SCALE).abs() < 1e-6);
        assert!((s.current_quality - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_override_quality_follows_tier() {
        let c = controller();
        c.override_quality(0.9);
        let s = c.state();
        assert!((s.current_quality - 0.9).abs() < 1e-6);
        assert!((s.current_scale - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_reset_restores_knobs() {
        let c = controller();
        for _ in 0..OVER_STREAK {
            c.on_frame_complete(50.0);
        }
        assert!(c.state().current_scale < 0.5);
        c.reset();
        let s = c.state();
        assert!((s.current_scale - 0.5).abs() < 1e-6);
        assert_eq!(s.consecutive_over, 0);
    }
}
