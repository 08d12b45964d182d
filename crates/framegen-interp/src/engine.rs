//! The interpolation engine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use framegen_compute::ComputeBackend;
use framegen_core::{EngineConfig, Frame, GpuFence, NeuralBackend, scale_for_quality};
use framegen_errors::{InterpolationError, ValidationError};
use tracing::{debug, info, warn};

use crate::fallback::FlowStrategy;
use crate::neural::NeuralStrategy;
use crate::strategy::{Strategy, StrategyKind};

/// Timesteps of `count` equally spaced frames: `i / (count + 1)`.
#[must_use]
pub fn timesteps(count: usize) -> Vec<f32> {
    let denom = (count + 1) as f32;
    (1..=count).map(|i| i as f32 / denom).collect()
}

/// Synthesizes frames between two source frames under a time budget.
#[derive(Debug)]
pub struct InterpolationEngine {
    strategy: Strategy,
    knobs: EngineConfig,
    last_motion: Duration,
    last_elapsed: Duration,
}

impl InterpolationEngine {
    /// Build an engine and pick its strategy.
    ///
    /// The neural strategy is used when `neural` is given, the config names
    /// a model, and the model loads. Otherwise the flow fallback is used for
    /// the engine's whole lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: &EngineConfig,
        compute: Arc<dyn ComputeBackend>,
        neural: Option<Box<dyn NeuralBackend>>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        let strategy = match (neural, config.model_path.as_deref()) {
            (Some(backend), Some(path)) => match NeuralStrategy::load(backend, path) {
                Ok(neural) => Strategy::Neural(neural),
                Err(e) => {
                    warn!(error = %e, "Model unavailable, using flow fallback");
                    Strategy::Fallback(FlowStrategy::new(compute, config.motion.clone())?)
                }
            },
            (Some(_), None) => {
                info!("Neural backend given without a model path, using flow fallback");
                Strategy::Fallback(FlowStrategy::new(compute, config.motion.clone())?)
            }
            (None, _) => Strategy::Fallback(FlowStrategy::new(compute, config.motion.clone())?),
        };
        info!(
            strategy = %strategy.kind(),
            budget_ns = config.max_frame_time_ns,
            model_scale = config.model_scale,
            "Interpolation engine ready"
        );
        Ok(Self {
            strategy,
            knobs: config.clone(),
            last_motion: Duration::ZERO,
            last_elapsed: Duration::ZERO,
        })
    }

    /// The active strategy.
    #[must_use]
    pub fn strategy(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Current quality.
    #[must_use]
    pub fn quality(&self) -> f32 {
        self.knobs.quality
    }

    /// Current model scale.
    #[must_use]
    pub fn model_scale(&self) -> f32 {
        self.knobs.model_scale
    }

    /// Per-call budget in nanoseconds.
    #[must_use]
    pub fn budget_ns(&self) -> u64 {
        self.knobs.max_frame_time_ns
    }

    /// Set the quality and remap the model scale by tier.
    pub fn set_quality(&mut self, quality: f32) {
        self.knobs.set_quality(quality);
        self.knobs.set_model_scale(scale_for_quality(self.knobs.quality));
    }

    /// Set the model scale directly, clamped to [0.25, 1].
    pub fn set_model_scale(&mut self, scale: f32) {
        self.knobs.set_model_scale(scale);
    }

    /// Apply both knobs from the adaptive controller.
    pub fn apply_adaptive(&mut self, quality: f32, scale: f32) {
        self.knobs.set_quality(quality);
        self.knobs.set_model_scale(scale);
    }

    /// Replace the per-call budget.
    pub fn set_budget_ns(&mut self, budget_ns: u64) {
        self.knobs.max_frame_time_ns = budget_ns;
    }

    /// Flow time of the most recent fallback call; zero for the neural strategy.
    #[must_use]
    pub fn last_motion_elapsed(&self) -> Duration {
        self.last_motion
    }

    /// Duration of the most recent interpolation call.
    #[must_use]
    pub fn last_elapsed(&self) -> Duration {
        self.last_elapsed
    }

    /// Synthesize the frame at `t` between `a` and `b`.
    ///
    /// # Errors
    ///
    /// - [`InterpolationError::InvalidTimestep`] unless `0 < t < 1`
    /// - [`InterpolationError::Validation`] if the frames differ in size
    /// - [`InterpolationError::BudgetExceeded`] if the call took longer than
    ///   the budget; the late frame is discarded
    /// - compute or inference errors from the strategy
    pub fn interpolate(&mut self, a: &Frame, b: &Frame, t: f32) -> Result<Frame, InterpolationError> {
        if !(t > 0.0 && t < 1.0) {
            return Err(InterpolationError::InvalidTimestep(t));
        }
        if a.dimensions() != b.dimensions() {
            return Err(ValidationError::dimension_mismatch(a.dimensions(), b.dimensions()).into());
        }

        let start = Instant::now();
        let scale = self.knobs.model_scale;
        let image = match &mut self.strategy {
            Strategy::Neural(neural) => {
                self.last_motion = Duration::ZERO;
                neural.synthesize(a, b, t, scale)?
            }
            Strategy::Fallback(flow) => {
                let image = flow.synthesize(a, b, t, scale)?;
                self.last_motion = flow.last_motion_elapsed();
                image
            }
        };
        let elapsed = start.elapsed();
        self.last_elapsed = elapsed;

        let elapsed_ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        let budget_ns = self.knobs.max_frame_time_ns;
        if elapsed_ns > budget_ns {
            debug!(elapsed_ns, budget_ns, t, "Interpolation over budget");
            return Err(InterpolationError::BudgetExceeded {
                elapsed_ns,
                budget_ns,
            });
        }
        Ok(Frame::synthetic(image, a, b, t, GpuFence::signaled()))
    }

    /// Synthesize `count` equally spaced frames between `a` and `b`.
    ///
    /// Stops at the first failure and returns the frames produced so far.
    /// Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns the error of the first interpolation if it fails.
    pub fn interpolate_multi(
        &mut self,
        a: &Frame,
        b: &Frame,
        count: usize,
    ) -> Result<Vec<Frame>, InterpolationError> {
        let mut frames = Vec::with_capacity(count);
        for t in timesteps(count) {
            match self.interpolate(a, b, t) {
                Ok(frame) => frames.push(frame),
                Err(e) if frames.is_empty() => return Err(e),
                Err(e) => {
                    debug!(
                        error = %e,
                        produced = frames.len(),
                        requested = count,
                        "Truncated interpolation batch"
                    );
                    break;
                }
            }
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_timestep_is_half() {
        assert_eq!(timesteps(1), vec![0.5]);
    }

    #[test]
    fn test_timesteps_for_quadruple() {
        let ts = timesteps(3);
        assert_eq!(ts.len(), 3);
        assert!((ts[0] - 0.25).abs() < 1e-6);
        assert!((ts[1] - 0.5).abs() < 1e-6);
        assert!((ts[2] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_zero_count_is_empty() {
        assert!(timesteps(0).is_empty());
    }
}
