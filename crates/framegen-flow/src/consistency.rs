//! Forward-backward consistency check (`flow_consistency`).

use framegen_compute::params::ConsistencyParams;
use framegen_compute::{ComputePass, GroupCounts, GroupId, TILE_SIZE, shaders};
use framegen_core::{MotionField, Plane};
use framegen_errors::ValidationError;
use ndarray::{Zip, s};

/// Confidence for a round-trip error, or 0 when occluded.
#[inline]
#[must_use]
pub fn confidence_for(error: f32, threshold: f32) -> f32 {
    if error > threshold {
        0.0
    } else {
        1.0 / (1.0 + error)
    }
}

/// Per-pixel check `|F(x) + B(x + F(x))|` producing a confidence plane.
pub struct ConsistencyPass<'a> {
    forward: &'a MotionField,
    backward: &'a MotionField,
    confidence: Plane,
    occluded: u64,
    params: ConsistencyParams,
}

impl<'a> ConsistencyPass<'a> {
    /// Bind both flows.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] if the flows differ in size.
    pub fn new(
        forward: &'a MotionField,
        backward: &'a MotionField,
        threshold: f32,
    ) -> Result<Self, ValidationError> {
        let (width, height) = forward.dimensions();
        if !backward.is_valid_for(width, height) {
            return Err(ValidationError::dimension_mismatch(
                forward.dimensions(),
                backward.dimensions(),
            ));
        }
        Ok(Self {
            forward,
            backward,
            confidence: Plane::zeros(width, height)?,
            occluded: 0,
            params: ConsistencyParams {
                width,
                height,
                threshold,
                _pad: 0,
            },
        })
    }

    /// Confidence plane and occluded-pixel count.
    #[must_use]
    pub fn into_output(self) -> (Plane, u64) {
        (self.confidence, self.occluded)
    }
}

impl ComputePass for ConsistencyPass<'_> {
    fn pipeline(&self) -> &'static str {
        shaders::FLOW_CONSISTENCY
    }

    fn groups(&self) -> GroupCounts {
        GroupCounts::covering(self.params.width, self.params.height, TILE_SIZE)
    }

    fn push_constants(&self) -> &[u8] {
        bytemuck::bytes_of(&self.params)
    }

    fn run_group(&mut self, group: GroupId) {
        let (xs, ys) = group.tile(TILE_SIZE, self.params.width, self.params.height);
        let threshold = self.params.threshold;
        let backward = self.backward;
        let tile = s![ys.start as usize..ys.end as usize, xs.start as usize..xs.end as usize];
        let (x0, y0) = (xs.start as f32, ys.start as f32);
        let mut occluded = 0;
        Zip::indexed(self.confidence.view_mut().slice_move(tile))
            .and(self.forward.dx().slice_move(tile))
            .and(self.forward.dy().slice_move(tile))
            .for_each(|(ty, tx), confidence, &fx, &fy| {
                let (x, y) = (x0 + tx as f32, y0 + ty as f32);
                let (bx, by) = backward.sample_bilinear(x + fx, y + fy);
                let error = (fx + bx).hypot(fy + by);
                if error > threshold {
                    occluded += 1;
                }
                *confidence = confidence_for(error, threshold);
            });
        self.occluded += occluded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framegen_compute::{ComputeBackend, HostComputeBackend};
    use framegen_errors::MotionError;

    #[test]
    fn test_confidence_curve() {
        assert!((confidence_for(0.0, 1.5) - 1.0).abs() < 1e-6);
        assert!((confidence_for(1.0, 1.5) - 0.5).abs() < 1e-6);
        assert!(confidence_for(1.6, 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_inverse_flows_are_consistent() -> Result<(), MotionError> {
        let backend = HostComputeBackend::with_builtin_kernels();
        let forward = MotionField::uniform(24, 24, 2.0, -1.0)?;
        let backward = MotionField::uniform(24, 24, -2.0, 1.0)?;
        let mut pass = ConsistencyPass::new(&forward, &backward, 1.5)?;
        backend.dispatch_and_wait(&mut pass)?;
        let (confidence, occluded) = pass.into_output();
        assert_eq!(occluded, 0);
        assert!(confidence.view().iter().all(|c| (c - 1.0).abs() < 1e-6));
        Ok(())
    }

    #[test]
    fn test_group_covers_only_its_tile() -> Result<(), ValidationError> {
        let mut forward = MotionField::zeros(TILE_SIZE + 4, 3)?;
        forward.set_vector(TILE_SIZE + 1, 1, 5.0, 0.0);
        let backward = MotionField::zeros(TILE_SIZE + 4, 3)?;
        let mut pass = ConsistencyPass::new(&forward, &backward, 1.5)?;
        pass.run_group(GroupId { x: 1, y: 0, z: 0 });
        let (confidence, occluded) = pass.into_output();
        assert_eq!(occluded, 1);
        assert!(confidence.get(TILE_SIZE + 1, 1).abs() < 1e-9);
        assert!((confidence.get(TILE_SIZE, 0) - 1.0).abs() < 1e-6);
        assert!(confidence.get(TILE_SIZE - 1, 0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_disagreeing_flows_are_occluded() -> Result<(), MotionError> {
        let backend = HostComputeBackend::with_builtin_kernels();
        let forward = MotionField::uniform(16, 16, 3.0, 0.0)?;
        let backward = MotionField::zeros(16, 16)?;
        let mut pass = ConsistencyPass::new(&forward, &backward, 1.5)?;
        backend.dispatch_and_wait(&mut pass)?;
        let (confidence, occluded) = pass.into_output();
        assert_eq!(occluded, 256);
        assert!(confidence.view().iter().all(|c| c.abs() < 1e-9));
        Ok(())
    }
}
