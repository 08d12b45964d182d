//! RGBA to luma conversion (`rgb_to_gray`).

use framegen_compute::params::ExtentParams;
use framegen_compute::{ComputeBackend, ComputePass, GroupCounts, GroupId, TILE_SIZE, shaders};
use framegen_core::{FrameImage, Plane};
use framegen_errors::MotionError;

const RED: f32 = 0.299;
const GREEN: f32 = 0.587;
const BLUE: f32 = 0.114;

/// Rec. 601 luma of an RGBA pixel in [0, 1].
#[inline]
#[must_use]
pub fn luma_of(rgba: [u8; 4]) -> f32 {
    (RED * f32::from(rgba[0]) + GREEN * f32::from(rgba[1]) + BLUE * f32::from(rgba[2])) / 255.0
}

/// Converts one frame image to a luma plane.
pub struct LumaPass<'a> {
    src: &'a FrameImage,
    dst: Plane,
    params: ExtentParams,
}

impl<'a> LumaPass<'a> {
    /// Bind `src` and allocate the output plane.
    ///
    /// # Errors
    ///
    /// Returns an error if the image has a zero dimension.
    pub fn new(src: &'a FrameImage) -> Result<Self, MotionError> {
        let (width, height) = src.dimensions();
        Ok(Self {
            src,
            dst: Plane::zeros(width, height)?,
            params: ExtentParams { width, height },
        })
    }

    /// The converted plane.
    #[must_use]
    pub fn into_output(self) -> Plane {
        self.dst
    }
}

impl ComputePass for LumaPass<'_> {
    fn pipeline(&self) -> &'static str {
        shaders::RGB_TO_GRAY
    }

    fn groups(&self) -> GroupCounts {
        GroupCounts::covering(self.params.width, self.params.height, TILE_SIZE)
    }

    fn push_constants(&self) -> &[u8] {
        bytemuck::bytes_of(&self.params)
    }

    fn run_group(&mut self, group: GroupId) {
        let (xs, ys) = group.tile(TILE_SIZE, self.params.width, self.params.height);
        for y in ys {
            for x in xs.clone() {
                self.dst.set(x, y, luma_of(self.src.rgba_at(x, y)));
            }
        }
    }
}

/// Dispatch `rgb_to_gray` for `image` and wait for the result.
///
/// # Errors
///
/// Returns an error if the image is empty or the dispatch is rejected.
pub fn to_luma(backend: &dyn ComputeBackend, image: &FrameImage) -> Result<Plane, MotionError> {
    let mut pass = LumaPass::new(image)?;
    backend.dispatch_and_wait(&mut pass)?;
    Ok(pass.into_output())
}

#[cfg(test)]
mod tests {
    use super::*;
    use framegen_compute::HostComputeBackend;
    use framegen_core::PixelFormat;

    #[test]
    fn test_luma_weights() {
        assert!((luma_of([255, 255, 255, 255]) - 1.0).abs() < 1e-5);
        assert!(luma_of([0, 0, 0, 255]).abs() < 1e-6);
        assert!((luma_of([255, 0, 0, 0]) - RED).abs() < 1e-6);
    }

    #[test]
    fn test_bgra_converts_by_channel_meaning() -> Result<(), MotionError> {
        let backend = HostComputeBackend::with_builtin_kernels();
        let rgba = FrameImage::filled(20, 18, PixelFormat::Rgba8, [200, 10, 10, 255])?;
        let bgra = FrameImage::filled(20, 18, PixelFormat::Bgra8, [200, 10, 10, 255])?;
        let a = to_luma(&backend, &rgba)?;
        let b = to_luma(&backend, &bgra)?;
        assert_eq!(a.dimensions(), (20, 18));
        assert!((a.mean() - b.mean()).abs() < 1e-5);
        Ok(())
    }
}
