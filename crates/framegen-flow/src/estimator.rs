//! Coarse-to-fine block-matching motion estimation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use framegen_compute::ComputeBackend;
use framegen_compute::params::BlockMatchParams;
use framegen_core::{Frame, MotionField, MotionParams, Plane};
use framegen_errors::{MotionError, ValidationError};
use tracing::{debug, trace};

use crate::block::{BlockField, BlockMatchPass, RefinePass};
use crate::luma::to_luma;
use crate::pyramid::{Pyramid, usable_levels};

/// Which way a field points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    /// From the first frame to the second
    Forward,
    /// From the second frame to the first
    Backward,
}

impl FlowDirection {
    fn sign(self) -> i32 {
        match self {
            FlowDirection::Forward => 1,
            FlowDirection::Backward => -1,
        }
    }
}

/// A dense field and how long it took.
#[derive(Debug, Clone)]
pub struct MotionEstimate {
    /// Displacement from the first frame to the second
    pub field: MotionField,
    /// Wall time of the estimate, luma conversion included
    pub elapsed: Duration,
}

/// Pyramidal block-matching estimator.
///
/// Each call dispatches `rgb_to_gray`, `downsample` for every level,
/// `block_match` from the coarsest level down, then `flow_refine`. Any
/// rejected dispatch fails the whole estimate.
pub struct MotionEstimator {
    backend: Arc<dyn ComputeBackend>,
    params: MotionParams,
}

impl std::fmt::Debug for MotionEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionEstimator")
            .field("backend", &self.backend.name())
            .field("params", &self.params)
            .finish()
    }
}

impl MotionEstimator {
    /// Create an estimator.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` fails validation.
    pub fn new(backend: Arc<dyn ComputeBackend>, params: MotionParams) -> Result<Self, ValidationError> {
        params.validate()?;
        Ok(Self { backend, params })
    }

    /// Current parameters.
    #[must_use]
    pub fn params(&self) -> &MotionParams {
        &self.params
    }

    /// The backend every pass is dispatched on.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn ComputeBackend> {
        &self.backend
    }

    /// Replace all parameters.
    ///
    /// # Errors
    ///
    /// Returns an error and keeps the old parameters if `params` is invalid.
    pub fn set_params(&mut self, params: MotionParams) -> Result<(), ValidationError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Set the block edge length.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is out of range.
    pub fn set_block_size(&mut self, block_size: u32) -> Result<(), ValidationError> {
        self.set_params(MotionParams {
            block_size,
            ..self.params
        })
    }

    /// Set the coarsest-level search radius.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is out of range.
    pub fn set_search_radius(&mut self, search_radius: u32) -> Result<(), ValidationError> {
        self.set_params(MotionParams {
            search_radius,
            ..self.params
        })
    }

    /// Set the pyramid depth.
    ///
    /// # Errors
    ///
    /// Returns an error if the level count is out of range.
    pub fn set_pyramid_levels(&mut self, pyramid_levels: u32) -> Result<(), ValidationError> {
        self.set_params(MotionParams {
            pyramid_levels,
            ..self.params
        })
    }

    /// Estimate motion from `a` to `b`.
    ///
    /// # Errors
    ///
    /// Returns [`MotionError::Validation`] if the frames differ in size and
    /// [`MotionError::Compute`] if any dispatch is rejected.
    pub fn estimate(&self, a: &Frame, b: &Frame) -> Result<MotionEstimate, MotionError> {
        let start = Instant::now();
        check_same_size(a.dimensions(), b.dimensions())?;
        let luma_a = to_luma(self.backend.as_ref(), a.image())?;
        let luma_b = to_luma(self.backend.as_ref(), b.image())?;
        let field = self.estimate_planes(luma_a, luma_b)?;
        Ok(MotionEstimate {
            field,
            elapsed: start.elapsed(),
        })
    }

    /// Estimate motion between two luma planes.
    ///
    /// # Errors
    ///
    /// See [`MotionEstimator::estimate`].
    pub fn estimate_luma(&self, a: &Plane, b: &Plane) -> Result<MotionEstimate, MotionError> {
        let start = Instant::now();
        let field = self.estimate_planes(a.clone(), b.clone())?;
        Ok(MotionEstimate {
            field,
            elapsed: start.elapsed(),
        })
    }

    fn estimate_planes(&self, a: Plane, b: Plane) -> Result<MotionField, MotionError> {
        check_same_size(a.dimensions(), b.dimensions())?;
        let (pa, pb) = self.pyramids(a, b)?;
        self.match_pyramids(&pa, &pb, FlowDirection::Forward)
    }

    /// Build matching pyramids for both planes.
    pub(crate) fn pyramids(&self, a: Plane, b: Plane) -> Result<(Pyramid, Pyramid), MotionError> {
        let (width, height) = a.dimensions();
        let levels = usable_levels(width, height, self.params.block_size, self.params.pyramid_levels);
        if levels < self.params.pyramid_levels {
            trace!(
                requested = self.params.pyramid_levels,
                levels, width, height, "Clamped pyramid depth"
            );
        }
        let backend = self.backend.as_ref();
        Ok((Pyramid::build(backend, a, levels)?, Pyramid::build(backend, b, levels)?))
    }

    /// Match `reference` against `target` from the coarsest level down and
    /// refine at full resolution.
    pub(crate) fn match_pyramids(
        &self,
        reference: &Pyramid,
        target: &Pyramid,
        direction: FlowDirection,
    ) -> Result<MotionField, MotionError> {
        let backend = self.backend.as_ref();
        let levels = reference.len().min(target.len());
        let coarsest = levels.saturating_sub(1);
        let mut seeds: Option<BlockField> = None;

        for level in (0..levels).rev() {
            let (Some(ref_plane), Some(tgt_plane)) = (reference.level(level), target.level(level))
            else {
                break;
            };
            let steps = (coarsest - level) as u32;
            let radius = if level == coarsest {
                self.params.search_radius
            } else {
                (self.params.search_radius >> steps).max(1)
            };
            let params = BlockMatchParams {
                width: ref_plane.width(),
                height: ref_plane.height(),
                block_size: self.params.block_size,
                search_radius: radius,
                level: level as u32,
                total_levels: levels as u32,
                direction: direction.sign(),
                _pad: 0,
            };
            let mut pass = BlockMatchPass::new(ref_plane, tgt_plane, seeds.as_ref(), params);
            backend.dispatch_and_wait(&mut pass)?;
            seeds = Some(pass.into_output());
        }

        let (Some(blocks), Some(ref_full), Some(tgt_full)) =
            (seeds, reference.level(0), target.level(0))
        else {
            return Err(ValidationError::constraint("empty pyramid").into());
        };
        let mut refine = RefinePass::new(ref_full, tgt_full, &blocks)?;
        backend.dispatch_and_wait(&mut refine)?;
        let field = refine.into_output();
        debug!(
            ?direction,
            levels,
            max_component = field.max_abs_component(),
            "Motion field estimated"
        );
        Ok(field)
    }
}

pub(crate) fn check_same_size(a: (u32, u32), b: (u32, u32)) -> Result<(), ValidationError> {
    if a == b {
        Ok(())
    } else {
        Err(ValidationError::dimension_mismatch(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framegen_compute::HostComputeBackend;

    fn estimator() -> Result<MotionEstimator, ValidationError> {
        MotionEstimator::new(
            Arc::new(HostComputeBackend::with_builtin_kernels()),
            MotionParams::default(),
        )
    }

    #[test]
    fn test_invalid_setters_keep_params() -> Result<(), ValidationError> {
        let mut est = estimator()?;
        assert!(est.set_block_size(0).is_err());
        assert_eq!(est.params().block_size, 8);
        est.set_search_radius(4)?;
        est.set_pyramid_levels(2)?;
        assert_eq!(est.params().search_radius, 4);
        assert_eq!(est.params().pyramid_levels, 2);
        Ok(())
    }

    #[test]
    fn test_size_mismatch_rejected() -> Result<(), MotionError> {
        let est = estimator()?;
        let a = Plane::zeros(16, 16)?;
        let b = Plane::zeros(16, 8)?;
        assert!(matches!(
            est.estimate_luma(&a, &b),
            Err(MotionError::Validation(ValidationError::DimensionMismatch { .. }))
        ));
        Ok(())
    }

    #[test]
    fn test_tiny_plane_uses_single_level() -> Result<(), MotionError> {
        let est = estimator()?;
        let a = Plane::filled(4, 4, 0.3)?;
        let estimate = est.estimate_luma(&a, &a)?;
        assert_eq!(estimate.field.dimensions(), (4, 4));
        assert!(estimate.field.max_abs_component() < 1e-6);
        Ok(())
    }
}
