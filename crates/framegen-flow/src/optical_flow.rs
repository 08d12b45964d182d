//! Bidirectional dense optical flow with per-pixel confidence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use framegen_compute::ComputeBackend;
use framegen_core::{Frame, MotionField, MotionParams, Plane};
use framegen_errors::{MotionError, ValidationError};
use tracing::debug;

use crate::consistency::ConsistencyPass;
use crate::estimator::{FlowDirection, MotionEstimator, check_same_size};
use crate::luma::to_luma;

/// Output of [`OpticalFlowEngine::compute_bidirectional`].
#[derive(Debug, Clone)]
pub struct FlowResult {
    /// Flow from the first frame to the second
    pub forward: MotionField,
    /// Flow from the second frame to the first
    pub backward: MotionField,
    /// `1 / (1 + err)` where consistent, 0 where occluded
    pub confidence: Plane,
    /// Pixels whose round-trip error exceeded the threshold
    pub occluded_pixels: u64,
    /// Wall time of the whole computation
    pub elapsed: Duration,
}

impl FlowResult {
    /// Fraction of pixels marked occluded.
    #[must_use]
    pub fn occluded_fraction(&self) -> f32 {
        let total = self.confidence.len().max(1);
        self.occluded_pixels as f32 / total as f32
    }
}

/// Forward and backward flow followed by a consistency check.
///
/// The two directions are independent dispatch chains over shared
/// pyramids; the consistency pass runs only after both have completed.
#[derive(Debug)]
pub struct OpticalFlowEngine {
    estimator: MotionEstimator,
}

impl OpticalFlowEngine {
    /// Create an engine.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` fails validation.
    pub fn new(backend: Arc<dyn ComputeBackend>, params: MotionParams) -> Result<Self, ValidationError> {
        Ok(Self {
            estimator: MotionEstimator::new(backend, params)?,
        })
    }

    /// The underlying single-direction estimator.
    #[must_use]
    pub fn estimator(&self) -> &MotionEstimator {
        &self.estimator
    }

    /// Occlusion threshold in pixels.
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.estimator.params().consistency_threshold
    }

    /// Compute flow in both directions between `a` and `b`.
    ///
    /// # Errors
    ///
    /// Returns an error if the frames differ in size or any dispatch is
    /// rejected. No partial result is returned.
    pub fn compute_bidirectional(&self, a: &Frame, b: &Frame) -> Result<FlowResult, MotionError> {
        let start = Instant::now();
        check_same_size(a.dimensions(), b.dimensions())?;
        let backend = self.estimator.backend().as_ref();
        let luma_a = to_luma(backend, a.image())?;
        let luma_b = to_luma(backend, b.image())?;
        self.bidirectional(luma_a, luma_b, start)
    }

    /// Compute flow in both directions between two luma planes.
    ///
    /// The planes may be downscaled; the fields come out at their resolution.
    ///
    /// # Errors
    ///
    /// See [`OpticalFlowEngine::compute_bidirectional`].
    pub fn compute_bidirectional_luma(&self, a: &Plane, b: &Plane) -> Result<FlowResult, MotionError> {
        let start = Instant::now();
        check_same_size(a.dimensions(), b.dimensions())?;
        self.bidirectional(a.clone(), b.clone(), start)
    }

    fn bidirectional(&self, a: Plane, b: Plane, start: Instant) -> Result<FlowResult, MotionError> {
        let (pa, pb) = self.estimator.pyramids(a, b)?;
        let forward = self.estimator.match_pyramids(&pa, &pb, FlowDirection::Forward)?;
        let backward = self.estimator.match_pyramids(&pb, &pa, FlowDirection::Backward)?;

        let mut pass = ConsistencyPass::new(&forward, &backward, self.threshold())?;
        self.estimator.backend().dispatch_and_wait(&mut pass)?;
        let (confidence, occluded_pixels) = pass.into_output();

        let elapsed = start.elapsed();
        debug!(
            occluded_pixels,
            elapsed_us = elapsed.as_micros() as u64,
            "Bidirectional flow computed"
        );
        Ok(FlowResult {
            forward,
            backward,
            confidence,
            occluded_pixels,
            elapsed,
        })
    }
}
