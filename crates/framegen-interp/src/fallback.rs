//! Flow-based fallback strategy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use framegen_compute::ComputeBackend;
use framegen_core::{Frame, FrameImage, MotionField, MotionParams, Plane};
use framegen_errors::{InterpolationError, ValidationError};
use framegen_flow::{OpticalFlowEngine, resample, to_luma};
use tracing::debug;

use crate::warp::{BlendPass, WarpPass};

/// `round(n * scale)`, at least 1.
#[must_use]
pub fn scaled_extent(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let scale_dim = |n: u32| ((n as f32 * scale).round() as u32).max(1);
    (scale_dim(width), scale_dim(height))
}

/// Full-resolution flow for one source pair.
struct PairFlow {
    a: Arc<FrameImage>,
    b: Arc<FrameImage>,
    scale_bits: u32,
    forward: MotionField,
    backward: MotionField,
    confidence: Plane,
}

impl PairFlow {
    fn matches(&self, a: &Frame, b: &Frame, scale: f32) -> bool {
        Arc::ptr_eq(&self.a, &a.image) && Arc::ptr_eq(&self.b, &b.image) && self.scale_bits == scale.to_bits()
    }
}

/// Optical flow, warp toward `t`, blend with weight `t`.
///
/// Flow is computed once per source pair at `model_scale` and reused for
/// every timestep between the same two frames.
pub struct FlowStrategy {
    flow: OpticalFlowEngine,
    cached: Option<PairFlow>,
    last_motion: Duration,
}

impl std::fmt::Debug for FlowStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowStrategy")
            .field("flow", &self.flow)
            .field("cached", &self.cached.is_some())
            .field("last_motion", &self.last_motion)
            .finish()
    }
}

impl FlowStrategy {
    /// Create the strategy.
    ///
    /// # Errors
    ///
    /// Returns an error if the motion parameters are invalid.
    pub fn new(backend: Arc<dyn ComputeBackend>, params: MotionParams) -> Result<Self, ValidationError> {
        Ok(Self {
            flow: OpticalFlowEngine::new(backend, params)?,
            cached: None,
            last_motion: Duration::ZERO,
        })
    }

    /// The optical-flow engine.
    #[must_use]
    pub fn flow(&self) -> &OpticalFlowEngine {
        &self.flow
    }

    /// Time spent in the most recent flow computation.
    #[must_use]
    pub fn last_motion_elapsed(&self) -> Duration {
        self.last_motion
    }

    /// Synthesize the frame at `t` between `a` and `b`.
    ///
    /// # Errors
    ///
    /// Returns an error if any dispatch is rejected.
    pub fn synthesize(
        &mut self,
        a: &Frame,
        b: &Frame,
        t: f32,
        model_scale: f32,
    ) -> Result<FrameImage, InterpolationError> {
        self.ensure_pair_flow(a, b, model_scale)?;
        let pair = self
            .cached
            .as_ref()
            .ok_or_else(|| ValidationError::constraint("pair flow unavailable"))?;
        let backend = self.flow.estimator().backend().as_ref();

        let mut warp = WarpPass::new(a.image(), b.image(), &pair.forward, &pair.backward, t)?;
        backend.dispatch_and_wait(&mut warp)?;
        let warped = warp.into_output();

        let mut blend = BlendPass::new(
            a.image(),
            b.image(),
            &warped,
            &pair.forward,
            &pair.backward,
            &pair.confidence,
            t,
        )?;
        backend.dispatch_and_wait(&mut blend)?;
        Ok(blend.into_output())
    }

    fn ensure_pair_flow(&mut self, a: &Frame, b: &Frame, scale: f32) -> Result<(), InterpolationError> {
        if self.cached.as_ref().is_some_and(|c| c.matches(a, b, scale)) {
            return Ok(());
        }
        self.cached = None;
        let computed = self.compute_pair(a, b, scale)?;
        self.cached = Some(computed);
        Ok(())
    }

    fn compute_pair(&mut self, a: &Frame, b: &Frame, scale: f32) -> Result<PairFlow, InterpolationError> {
        let start = Instant::now();
        let (width, height) = a.dimensions();
        let (sw, sh) = scaled_extent(width, height, scale);
        let backend = self.flow.estimator().backend().as_ref();

        let luma_a = resample(backend, &to_luma(backend, a.image())?, sw, sh)?;
        let luma_b = resample(backend, &to_luma(backend, b.image())?, sw, sh)?;
        let result = self.flow.compute_bidirectional_luma(&luma_a, &luma_b)?;
        let forward = result.forward.resized(width, height)?;
        let backward = result.backward.resized(width, height)?;
        let confidence = resample(backend, &result.confidence, width, height)?;

        self.last_motion = start.elapsed();
        debug!(
            scaled_width = sw,
            scaled_height = sh,
            occluded = result.occluded_pixels,
            motion_us = self.last_motion.as_micros() as u64,
            "Pair flow computed"
        );
        Ok(PairFlow {
            a: Arc::clone(&a.image),
            b: Arc::clone(&b.image),
            scale_bits: scale.to_bits(),
            forward,
            backward,
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_extent() {
        assert_eq!(scaled_extent(1280, 720, 0.5), (640, 360));
        assert_eq!(scaled_extent(3, 3, 0.25), (1, 1));
        assert_eq!(scaled_extent(100, 50, 1.0), (100, 50));
    }
}
