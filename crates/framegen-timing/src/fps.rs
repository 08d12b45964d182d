//! Effective output rate.

use std::time::{Duration, Instant};

/// Counts presented frames and recomputes the rate once per window.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    window: Duration,
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FpsMeter {
    /// Meter with a one-second window starting at `now`.
    #[must_use]
    pub fn new(now: Instant) -> Self {
        Self::with_window(now, Duration::from_secs(1))
    }

    /// Meter with a custom window.
    #[must_use]
    pub fn with_window(now: Instant, window: Duration) -> Self {
        Self {
            window: window.max(Duration::from_millis(1)),
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Count one presented frame.
    pub fn record_frame(&mut self) {
        self.frames = self.frames.saturating_add(1);
    }

    /// Close the window if it has elapsed and return the new rate.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }
        self.fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = now;
        Some(self.fps)
    }

    /// Rate from the last closed window.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_over_one_window() {
        let start = Instant::now();
        let mut meter = FpsMeter::new(start);
        for _ in 0..60 {
            meter.record_frame();
        }
        assert_eq!(meter.tick(start + Duration::from_millis(500)), None);
        let fps = meter.tick(start + Duration::from_secs(1));
        assert!(fps.is_some_and(|f| (f - 60.0).abs() < 1e-3));
        assert_eq!(meter.tick(start + Duration::from_secs(2)), Some(0.0));
    }
}
